use std::env;

use failure::ResultExt;
use postgres::config::SslMode;
use postgres::{Client, Config as PgConfig, NoTls};

use config::Settings;
use errors::*;
use migrations::{self, Migration};

const PING: &str = "SELECT 1";
const DEFAULT_HOST: &str = "localhost";

/// Builds the connection descriptor, TLS always disabled.
///
/// An empty host means `localhost` and an empty user means the OS user. Other empty fields are left
/// for the driver to default.
pub fn connection_config(settings: &Settings) -> Result<PgConfig, Error> {
    let mut config = PgConfig::new();

    if settings.host.is_empty() {
        config.host(DEFAULT_HOST);
    } else {
        config.host(&settings.host);
    }
    if !settings.port.is_empty() {
        let port = settings
            .port
            .parse::<u16>()
            .context(format!("invalid port {:?}", settings.port))
            .context(ErrorKind::ConnectionOpen)?;
        config.port(port);
    }
    if !settings.user.is_empty() {
        config.user(&settings.user);
    } else if let Ok(user) = env::var("USER") {
        config.user(&user);
    }
    if !settings.password.is_empty() {
        config.password(&settings.password);
    }
    if !settings.name.is_empty() {
        config.dbname(&settings.name);
    }
    config.ssl_mode(SslMode::Disable);

    Ok(config)
}

/// Round trip on an open connection.
pub fn verify(client: &mut Client) -> Result<(), Error> {
    client.batch_execute(PING).context(ErrorKind::ConnectionVerify)?;
    Ok(())
}

/// Connects, checks the connection and resets the orders table.
pub fn initialize(settings: &Settings) -> Result<Client, Error> {
    initialize_with(settings, migrations::DEFAULT)
}

/// Same as `initialize`, applying the given migrations instead of the default reset.
///
/// On a migration failure the transaction is rolled back and the connection is closed.
pub fn initialize_with(settings: &Settings, migrations: &[Migration]) -> Result<Client, Error> {
    let config = connection_config(settings)?;

    debug!("Connecting to database {} at {}:{}", settings.name, settings.host, settings.port);
    let mut client = config.connect(NoTls).context(ErrorKind::ConnectionOpen)?;

    verify(&mut client)?;

    migrations::run(&mut client, migrations).context(ErrorKind::Schema)?;

    info!("Database initialized successfully");
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use postgres::config::Host;

    fn settings(port: &str) -> Settings {
        Settings {
            host: "localhost".to_string(),
            port: port.to_string(),
            user: "trader".to_string(),
            password: "secret".to_string(),
            name: "orders".to_string(),
        }
    }

    #[test]
    fn descriptor_carries_settings() {
        let config = connection_config(&settings("6543")).unwrap();

        assert_eq!(config.get_ports(), &[6543]);
        assert_eq!(config.get_user(), Some("trader"));
        assert_eq!(config.get_password(), Some(&b"secret"[..]));
        assert_eq!(config.get_dbname(), Some("orders"));
        assert_eq!(config.get_ssl_mode(), SslMode::Disable);
    }

    #[test]
    fn empty_host_means_localhost() {
        let config = connection_config(&Settings::default()).unwrap();

        assert_eq!(config.get_hosts(), &[Host::Tcp("localhost".to_string())]);
    }

    #[test]
    fn empty_user_means_os_user() {
        let config = connection_config(&Settings::default()).unwrap();

        assert_eq!(config.get_user().map(str::to_string), env::var("USER").ok());
    }

    #[test]
    fn other_empty_fields_are_left_unset() {
        let config = connection_config(&Settings::default()).unwrap();

        assert!(config.get_ports().is_empty());
        assert_eq!(config.get_password(), None);
        assert_eq!(config.get_dbname(), None);
    }

    #[test]
    fn bad_port_is_an_open_error() {
        for port in &["postgres", "70000", "-1"] {
            let err = connection_config(&settings(port)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConnectionOpen);
        }
    }
}
