//! Entry point for the `tilepack` command-line interface.
#![forbid(unsafe_code)]

use std::error::Error;

use env_logger::Env;
use tilepack_cli::CliError;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    match tilepack_cli::run() {
        Ok(()) => {}
        // Help, version and usage errors are rendered by clap itself.
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("tilepack: {}", describe(&err));
            std::process::exit(1);
        }
    }
}

fn describe(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}
