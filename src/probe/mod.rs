//! Interactive switch diagnostic.
//!
//! [`run`] asks for credentials, builds a connector and walks it through
//! three steps, printing a report as it goes:
//!
//! 1. model detection, best effort: failures print a warning and the run continues
//! 2. login, fatal on any failure
//! 3. info retrieval and rendering, fatal on any failure
//!
//! The console is abstracted as a `BufRead` for answers plus two `Write`
//! sinks, the second one receiving the diagnostic trace of unexpected errors.

use std::io::{self, BufRead, Write};

use log::{debug, warn};
use thiserror::Error;

use crate::device::SwitchApi;
use crate::error::{ErrorKind, SwitchError};
use crate::info::SwitchInfo;
use crate::templates::SwitchModel;

pub use intake::{Credentials, read_credentials};
pub use report::{group_thousands, render_report};

/// Width of the `=` and `-` rules framing report sections.
const RULE_WIDTH: usize = 60;

/// Reasons a probe run stops early.
#[derive(Error, Debug)]
pub enum ProbeFailure {
    #[error("host is required")]
    MissingHost,

    #[error("password is required")]
    MissingPassword,

    #[error("failed to create connector: {0}")]
    Construction(SwitchError),

    /// The login call succeeded but produced no session cookie.
    #[error("login failed: no cookie received")]
    NoCookie,

    #[error("login step failed: {0}")]
    Login(SwitchError),

    #[error("info retrieval failed: {0}")]
    Fetch(SwitchError),

    /// An error the fetch step did not anticipate, with its context chain.
    #[error("unexpected failure: {0:#}")]
    Unexpected(anyhow::Error),

    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl ProbeFailure {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

fn rule(out: &mut impl Write, ch: char) -> io::Result<()> {
    writeln!(out, "{}", ch.to_string().repeat(RULE_WIDTH))
}

fn banner(out: &mut impl Write, title: &str) -> io::Result<()> {
    rule(out, '=')?;
    writeln!(out, "{title}")?;
    rule(out, '=')
}

/// Step 1. Never fails the run; only console errors propagate.
pub async fn detect_model<C: SwitchApi>(
    connector: &mut C,
    out: &mut impl Write,
) -> io::Result<Option<&'static SwitchModel>> {
    writeln!(out, "Step 1: Auto-detecting switch model...")?;
    let detected = match connector.autodetect_model().await {
        Ok(model) => {
            writeln!(out, "✓ Detected model: {}", model.name)?;
            writeln!(out, "✓ Number of ports: {}", connector.ports())?;
            Some(model)
        }
        Err(err) if err.kind() == ErrorKind::ModelNotDetected => {
            writeln!(out, "✗ Model detection failed: {err}")?;
            writeln!(out, "  Continuing anyway...")?;
            None
        }
        Err(err) => {
            writeln!(out, "✗ Error during model detection: {err}")?;
            writeln!(out, "  Continuing anyway...")?;
            None
        }
    };
    writeln!(out)?;
    Ok(detected)
}

/// Step 2. Any failure ends the run.
pub async fn login<C: SwitchApi>(
    connector: &mut C,
    out: &mut impl Write,
) -> Result<(), ProbeFailure> {
    writeln!(out, "Step 2: Testing login...")?;
    match connector.login_cookie().await {
        Ok(Some(cookie)) if !cookie.is_empty() => {
            writeln!(out, "✓ Login successful")?;
        }
        Ok(_) => {
            writeln!(out, "✗ Login failed - no cookie received")?;
            return Err(ProbeFailure::NoCookie);
        }
        Err(err) if err.kind() == ErrorKind::LoginFailed => {
            writeln!(out, "✗ {err}")?;
            return Err(ProbeFailure::Login(err));
        }
        Err(err) => {
            writeln!(out, "✗ Error during login: {err}")?;
            return Err(ProbeFailure::Login(err));
        }
    }
    writeln!(out)?;
    Ok(())
}

/// Step 3. Unexpected errors also get their full cause chain written to `trace`.
pub async fn fetch_info<C: SwitchApi>(
    connector: &mut C,
    out: &mut impl Write,
    trace: &mut impl Write,
) -> Result<SwitchInfo, ProbeFailure> {
    writeln!(out, "Step 3: Fetching switch information...")?;
    match connector.switch_infos().await {
        Ok(info) => {
            writeln!(out, "✓ Successfully retrieved switch information")?;
            writeln!(out)?;
            Ok(info)
        }
        Err(err) if err.kind() == ErrorKind::ConnectionError => {
            writeln!(out, "✗ {err}")?;
            Err(ProbeFailure::Fetch(err))
        }
        Err(err) => {
            writeln!(out, "✗ Error fetching switch information: {err}")?;
            let chain = anyhow::Error::new(err).context("fetching switch information");
            writeln!(trace, "Diagnostic trace:\n{chain:?}")?;
            Err(ProbeFailure::Unexpected(chain))
        }
    }
}

/// Runs the whole diagnostic.
///
/// `connect` builds the connector from the collected credentials; it is not
/// called when the credentials are incomplete. `out` is flushed before
/// returning, and a flush error fails an otherwise successful run.
pub async fn run<C, F>(
    input: &mut impl BufRead,
    out: &mut impl Write,
    trace: &mut impl Write,
    connect: F,
) -> Result<(), ProbeFailure>
where
    C: SwitchApi,
    F: FnOnce(&Credentials) -> Result<C, SwitchError>,
{
    let result = run_steps(input, out, trace, connect).await;
    match (result, out.flush()) {
        (Ok(()), Err(err)) => Err(ProbeFailure::Io(err)),
        (Err(failure), Err(err)) => {
            warn!("Failed to flush output after '{}': {}", failure, err);
            Err(failure)
        }
        (result, Ok(())) => result,
    }
}

async fn run_steps<C, F>(
    input: &mut impl BufRead,
    out: &mut impl Write,
    trace: &mut impl Write,
    connect: F,
) -> Result<(), ProbeFailure>
where
    C: SwitchApi,
    F: FnOnce(&Credentials) -> Result<C, SwitchError>,
{
    banner(out, "Mercury Switch Probe")?;
    writeln!(out)?;

    let credentials = match read_credentials(input, out) {
        Ok(credentials) => credentials,
        Err(failure) => {
            match &failure {
                ProbeFailure::MissingHost => writeln!(out, "Error: Host is required")?,
                ProbeFailure::MissingPassword => writeln!(out, "Error: Password is required")?,
                _ => {}
            }
            return Err(failure);
        }
    };

    writeln!(out)?;
    writeln!(
        out,
        "Connecting to {} as {}...",
        credentials.host, credentials.username
    )?;
    writeln!(out)?;

    let mut connector = match connect(&credentials) {
        Ok(connector) => connector,
        Err(err) => {
            writeln!(out, "Error creating connector: {err}")?;
            return Err(ProbeFailure::Construction(err));
        }
    };

    let model = detect_model(&mut connector, out).await?;
    debug!("Detected model: {:?}", model.map(|m| m.name));
    login(&mut connector, out).await?;
    let info = fetch_info(&mut connector, out, trace).await?;
    render_report(&info, connector.ports(), out)?;

    writeln!(out)?;
    banner(out, "Probe completed successfully!")?;
    Ok(())
}

mod intake;
mod report;
