extern crate env_logger;
extern crate failure;
#[macro_use]
extern crate log;
extern crate trading_service_lib as lib;

use std::process::exit;

use failure::Fail;

fn run() -> Result<(), lib::Error> {
    let settings = lib::config::load()?;
    let _client = lib::database::initialize(&settings)?;

    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("{}", e);
        let mut cause = e.cause();
        while let Some(c) = cause {
            error!("  caused by: {}", c);
            cause = c.cause();
        }
        exit(1);
    }
}
