use super::*;

use crate::config::DEFAULT_USERNAME;

/// Credentials collected from the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub username: String,
    pub password: String,
}

fn ask(input: &mut impl BufRead, out: &mut impl Write, prompt: &str) -> io::Result<String> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    // End of input reads as an empty answer.
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Prompts for host, username and password.
///
/// A blank username becomes [`DEFAULT_USERNAME`]. The password is read like
/// any other line, without suppressing echo.
pub fn read_credentials(
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Credentials, ProbeFailure> {
    let host = ask(input, out, "Enter switch host (IP address): ")?;
    if host.is_empty() {
        return Err(ProbeFailure::MissingHost);
    }

    let username = ask(input, out, &format!("Enter username (default: {DEFAULT_USERNAME}): "))?;
    let username = if username.is_empty() {
        DEFAULT_USERNAME.to_string()
    } else {
        username
    };

    let password = ask(input, out, "Enter password: ")?;
    if password.is_empty() {
        return Err(ProbeFailure::MissingPassword);
    }

    Ok(Credentials {
        host,
        username,
        password,
    })
}
