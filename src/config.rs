//! Connector configuration and web interface constants.
//!
//! The switch web interface exposes one page per data set. The paths and form
//! fields below are shared by every model of the Pro family.

use std::time::Duration;

/// Username used when the operator leaves the prompt blank.
pub const DEFAULT_USERNAME: &str = "admin";

/// Login form target.
pub const LOGIN_PATH: &str = "/logon.cgi";

/// System identity page (`info_ds`).
pub const SYSTEM_INFO_PATH: &str = "/SystemInfoRpm.htm";

/// Port statistics page (`all_info`).
pub const PORT_STATISTICS_PATH: &str = "/PortStatisticsRpm.htm";

/// 802.1Q VLAN page (`qvlan_ds`).
pub const VLAN_8021Q_PATH: &str = "/Vlan8021QRpm.htm";

/// Value of the submit field the login form sends.
pub const LOGIN_SUBMIT_VALUE: &str = "Login";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("mercury-probe/", env!("CARGO_PKG_VERSION"));

/// HTTP settings used by [`crate::device::MercurySwitchConnector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// URL scheme, the switches only serve plain `http`.
    pub scheme: String,
    /// Timeout applied to each request.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ConnectorConfig {
    /// Builds the absolute URL of `path` on `host`.
    pub fn url(&self, host: &str, path: &str) -> String {
        format!("{}://{}{}", self.scheme, host, path)
    }
}
