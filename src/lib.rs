//! Startup plumbing for the trading service: settings from env files, then a connection to
//! Postgres with a freshly reset `orders` table.
extern crate config as config_crate;
extern crate dotenvy;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
extern crate postgres;
extern crate serde;
#[macro_use]
extern crate serde_derive;

#[cfg(test)]
#[macro_use]
extern crate maplit;

pub mod config;
pub mod database;
pub mod errors;
pub mod migrations;

pub use config::Settings;
pub use errors::{Error, ErrorKind};
