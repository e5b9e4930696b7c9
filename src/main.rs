//! Interactive diagnostic for a Mercury Pro switch.
//!
//! Prompts for host and credentials, then detects the model, logs in and
//! prints everything the switch reports. Set `RUST_LOG=debug` to see the
//! requests being made.

use std::io;
use std::process::ExitCode;

use log::debug;
use mercury_probe::device::MercurySwitchConnector;
use mercury_probe::probe;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error starting runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    let mut trace = io::stderr();

    let result = runtime.block_on(probe::run(&mut input, &mut out, &mut trace, |creds| {
        MercurySwitchConnector::new(&creds.host, &creds.username, &creds.password)
    }));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            debug!("Probe stopped: {}", failure);
            ExitCode::from(failure.exit_code())
        }
    }
}
