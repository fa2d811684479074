//! Service settings, read from the first env file found among a list of candidate locations.
//!
//! Files are parsed into an explicit map and never applied to the process environment.
//! Variables already set in the process environment take precedence over file values.
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use config_crate::{Config as RawConfig, ConfigError};
use dotenvy;
use failure::{self, ResultExt};

use errors::*;

pub type Vars = HashMap<String, String>;

pub const HOST_VAR: &str = "DB_HOST";
pub const PORT_VAR: &str = "DB_PORT";
pub const USER_VAR: &str = "DB_USER";
pub const PASSWORD_VAR: &str = "DB_PASSWORD";
pub const NAME_VAR: &str = "DB_NAME";

const VARIABLES: [&str; 5] = [HOST_VAR, PORT_VAR, USER_VAR, PASSWORD_VAR, NAME_VAR];

/// Current directory, system-wide install, parent directory. Checked in this order.
pub const DEFAULT_LOCATIONS: [&str; 3] = [".env", "/opt/trading-service/.env", "../.env"];

/// Database connection settings
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "db_host")]
    pub host: String,
    #[serde(rename = "db_port")]
    pub port: String,
    #[serde(rename = "db_user")]
    pub user: String,
    #[serde(rename = "db_password")]
    pub password: String,
    /// Database name
    #[serde(rename = "db_name")]
    pub name: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Settings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

/// A possible source of environment variables.
pub trait Candidate {
    fn describe(&self) -> String;

    /// `Ok(None)` if the source does not exist, `Err` if it exists but could not be parsed.
    fn resolve(&self) -> Result<Option<Vars>, failure::Error>;
}

/// `KEY=VALUE` env file on disk
pub struct EnvFile {
    path: PathBuf,
}

impl EnvFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl Candidate for EnvFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn resolve(&self) -> Result<Option<Vars>, failure::Error> {
        if fs::metadata(&self.path).is_err() {
            return Ok(None);
        }

        let mut vars = Vars::new();
        for item in dotenvy::from_path_iter(&self.path)? {
            let (key, value) = item?;
            vars.insert(key, value);
        }

        Ok(Some(vars))
    }
}

/// Variables supplied in memory, e.g. by an embedding service or a test.
pub struct Preset {
    name: String,
    vars: Vars,
}

impl Preset {
    pub fn new<N: Into<String>>(name: N, vars: Vars) -> Self {
        Self { name: name.into(), vars }
    }
}

impl Candidate for Preset {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn resolve(&self) -> Result<Option<Vars>, failure::Error> {
        Ok(Some(self.vars.clone()))
    }
}

pub struct Loader {
    candidates: Vec<Box<dyn Candidate>>,
    overrides: Vars,
}

impl Loader {
    /// Loader over the given candidates, without process environment overrides.
    pub fn new(candidates: Vec<Box<dyn Candidate>>) -> Self {
        Self {
            candidates,
            overrides: Vars::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: Vars) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn candidates(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.describe()).collect()
    }

    /// Returns the description and contents of the first candidate that exists and parses.
    pub fn resolve(&self) -> Result<(String, Vars), Error> {
        for candidate in &self.candidates {
            let location = candidate.describe();
            match candidate.resolve() {
                Ok(Some(vars)) => return Ok((location, vars)),
                Ok(None) => debug!("Environment file {} not found", location),
                Err(e) => warn!("Skipping environment file {}: {}", location, e),
            }
        }

        Err(ErrorKind::NoEnvironmentSource.into())
    }

    pub fn load(&self) -> Result<Settings, Error> {
        let (location, vars) = self.resolve()?;
        info!("Loading settings from {}", location);

        let settings = assemble(&vars, &self.overrides)
            .context(format!("unreadable settings in {}", location))
            .context(ErrorKind::NoEnvironmentSource)?;
        for &(var, value) in &[
            (HOST_VAR, &settings.host),
            (PORT_VAR, &settings.port),
            (USER_VAR, &settings.user),
            (PASSWORD_VAR, &settings.password),
            (NAME_VAR, &settings.name),
        ] {
            if value.is_empty() {
                warn!("{} is empty", var);
            }
        }

        Ok(settings)
    }
}

impl Default for Loader {
    /// Standard locations, with the process environment taking precedence over file values.
    fn default() -> Self {
        let candidates = DEFAULT_LOCATIONS
            .iter()
            .map(|loc| Box::new(EnvFile::new(*loc)) as Box<dyn Candidate>)
            .collect();
        let overrides = env::vars().filter(|(k, _)| VARIABLES.contains(&k.as_str())).collect();

        Loader::new(candidates).with_overrides(overrides)
    }
}

/// File values form the base layer, overrides sit on top.
fn assemble(vars: &Vars, overrides: &Vars) -> Result<Settings, ConfigError> {
    let mut raw = RawConfig::new();

    for var in VARIABLES.iter() {
        let key = var.to_lowercase();
        if let Some(value) = vars.get(*var) {
            raw.set_default(&key, value.clone())?;
        }
        if let Some(value) = overrides.get(*var) {
            raw.set(&key, value.clone())?;
        }
    }

    raw.try_into()
}

/// Loads settings from the standard locations.
pub fn load() -> Result<Settings, Error> {
    Loader::default().load()
}
