//! Login handling for the switch web interface.
//!
//! Logging in is a form post to [`LOGIN_PATH`](crate::config::LOGIN_PATH).
//! The switch answers with a page carrying `var logonInfo = new Array(code, ...)`
//! and a session cookie that must accompany every later page request.

use log::{debug, trace};
use reqwest::header::{HeaderMap, SET_COOKIE};

use crate::config::LOGIN_SUBMIT_VALUE;
use crate::error::{Result, SwitchError};
use crate::page::{self, parse_number};

/// Outcome code of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogonStatus {
    Success,
    BadCredentials,
    /// The account is locked or another administrator is logged in.
    UserLocked,
    /// The switch has no free session slot.
    SessionLimit,
    Unknown(u64),
}

impl LogonStatus {
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => LogonStatus::Success,
            1 => LogonStatus::BadCredentials,
            2 => LogonStatus::UserLocked,
            3 => LogonStatus::SessionLimit,
            other => LogonStatus::Unknown(other),
        }
    }

    /// Converts the status into `Ok(())` or a [`SwitchError::LoginFailed`].
    pub fn into_result(self) -> Result<()> {
        let reason = match self {
            LogonStatus::Success => return Ok(()),
            LogonStatus::BadCredentials => "wrong username or password".to_string(),
            LogonStatus::UserLocked => {
                "account locked or another user is logged in".to_string()
            }
            LogonStatus::SessionLimit => "maximum number of sessions reached".to_string(),
            LogonStatus::Unknown(code) => format!("switch returned login code {code}"),
        };
        Err(SwitchError::LoginFailed(reason))
    }
}

/// Form fields posted to the login endpoint.
pub fn login_form<'a>(username: &'a str, password: &'a str) -> [(&'static str, &'a str); 4] {
    [
        ("username", username),
        ("password", password),
        ("cpassword", ""),
        ("logon", LOGIN_SUBMIT_VALUE),
    ]
}

/// Decodes the login response page.
///
/// Firmware that redirects straight to the main page sends no `logonInfo`;
/// that counts as success unless the login form came back instead.
pub fn parse_logon_status(body: &str) -> Result<LogonStatus> {
    match page::extract_array(body, "logonInfo") {
        Ok(values) => {
            let code = values
                .first()
                .and_then(|raw| parse_number(raw))
                .ok_or_else(|| {
                    SwitchError::Parse(format!("unreadable logonInfo: {values:?}"))
                })?;
            trace!("logonInfo code {}", code);
            Ok(LogonStatus::from_code(code))
        }
        Err(_) if page::is_login_page(body) => Err(SwitchError::LoginFailed(
            "switch answered with the login page".to_string(),
        )),
        Err(_) => {
            debug!("No logonInfo in login response, assuming redirect to main page");
            Ok(LogonStatus::Success)
        }
    }
}

/// Returns the `name=value` part of the first `Set-Cookie` header.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .find(|pair| pair.contains('=') && !pair.ends_with('='))
        .map(str::to_string)
}
