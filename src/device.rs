//! Switch connectors.
//!
//! [`SwitchApi`] is the surface the probe drives. [`MercurySwitchConnector`]
//! implements it over the switch's HTTP web interface: model detection from
//! the pages served before login, form login with a session cookie, and
//! scraping of the system, port statistics and 802.1Q VLAN pages.

use log::{debug, trace, warn};
use reqwest::header::COOKIE;
use reqwest::{Client, RequestBuilder, Response};

use crate::config::{
    ConnectorConfig, LOGIN_PATH, PORT_STATISTICS_PATH, SYSTEM_INFO_PATH, VLAN_8021Q_PATH,
};
use crate::error::{Result, SwitchError};
use crate::info::{self, SwitchInfo};
use crate::page;
use crate::session;
use crate::templates::{self, SwitchModel};

/// Operations a switch client offers to the probe.
#[allow(async_fn_in_trait)]
pub trait SwitchApi {
    /// Identifies the model and, on success, fixes [`ports`](Self::ports).
    async fn autodetect_model(&mut self) -> Result<&'static SwitchModel>;

    /// Number of ports known so far; zero before anything told us.
    fn ports(&self) -> usize;

    /// Logs in and returns the session cookie, `None` if the switch sent none.
    async fn login_cookie(&mut self) -> Result<Option<String>>;

    /// Fetches the full switch-info mapping.
    async fn switch_infos(&mut self) -> Result<SwitchInfo>;
}

/// HTTP client for one Mercury Pro switch.
pub struct MercurySwitchConnector {
    host: String,
    username: String,
    password: String,
    config: ConnectorConfig,
    client: Client,
    model: Option<&'static SwitchModel>,
    ports: usize,
    cookie: Option<String>,
}

impl std::fmt::Debug for MercurySwitchConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MercurySwitchConnector")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("model", &self.model.map(|m| m.name))
            .field("ports", &self.ports)
            .field("logged_in", &self.cookie.is_some())
            .finish()
    }
}

/// Validates a host given by the operator, accepting an optional `http://`
/// prefix, a trailing slash and a `:port` suffix.
pub fn normalize_host(host: &str) -> Result<String> {
    let trimmed = host.trim();
    let bare = trimmed.strip_prefix("http://").unwrap_or(trimmed);
    let bare = bare.strip_suffix('/').unwrap_or(bare);
    if bare.is_empty() || bare.contains(|c: char| c.is_whitespace() || c == '/') {
        return Err(SwitchError::InvalidHost(host.to_string()));
    }
    Ok(bare.to_string())
}

impl MercurySwitchConnector {
    /// Creates a connector with the default [`ConnectorConfig`].
    ///
    /// No request is sent until one of the [`SwitchApi`] methods is called.
    pub fn new(host: &str, username: &str, password: &str) -> Result<Self> {
        Self::with_config(host, username, password, ConnectorConfig::default())
    }

    pub fn with_config(
        host: &str,
        username: &str,
        password: &str,
        config: ConnectorConfig,
    ) -> Result<Self> {
        let host = normalize_host(host)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .no_proxy()
            .build()?;
        debug!("Created connector for {}@{}", username, host);

        Ok(Self {
            host,
            username: username.to_string(),
            password: password.to_string(),
            config,
            client,
            model: None,
            ports: 0,
            cookie: None,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Model found by the last successful detection.
    pub fn model(&self) -> Option<&'static SwitchModel> {
        self.model
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Response> {
        let request = match &self.cookie {
            Some(cookie) => request.header(COOKIE, cookie.as_str()),
            None => request,
        };
        let response = request.send().await.map_err(|err| {
            SwitchError::Connection(format!("{}{} unreachable: {}", self.host, path, err))
        })?;
        let status = response.status();
        trace!("{}{} -> {}", self.host, path, status);
        if !status.is_success() {
            return Err(SwitchError::Connection(format!(
                "{}{} returned HTTP {}",
                self.host, path, status
            )));
        }
        Ok(response)
    }

    async fn get_page(&self, path: &str) -> Result<String> {
        let url = self.config.url(&self.host, path);
        let response = self.send(self.client.get(&url), path).await?;
        Ok(response.text().await?)
    }

    /// Fetches a status page, treating a returned login form as an expired session.
    async fn get_data_page(&mut self, path: &str) -> Result<String> {
        let body = self.get_page(path).await?;
        if page::is_login_page(&body) {
            self.cookie = None;
            return Err(SwitchError::LoginFailed(format!(
                "session rejected while loading {path}"
            )));
        }
        Ok(body)
    }
}

impl SwitchApi for MercurySwitchConnector {
    async fn autodetect_model(&mut self) -> Result<&'static SwitchModel> {
        for path in templates::detection_paths() {
            let body = self.get_page(path).await?;
            if let Some(model) = templates::detect(path, &body) {
                debug!("Detected {} on {} via {}", model.name, self.host, path);
                self.model = Some(model);
                self.ports = model.ports;
                return Ok(model);
            }
        }
        debug!(
            "Known models: {}",
            serde_json::to_string(&templates::model_catalog()).unwrap_or_default()
        );
        Err(SwitchError::ModelNotDetected(format!(
            "{} matched none of {}",
            self.host,
            templates::available_models().join(", ")
        )))
    }

    fn ports(&self) -> usize {
        self.ports
    }

    async fn login_cookie(&mut self) -> Result<Option<String>> {
        let url = self.config.url(&self.host, LOGIN_PATH);
        self.cookie = None;
        let request = self
            .client
            .post(&url)
            .form(&session::login_form(&self.username, &self.password));
        let response = self.send(request, LOGIN_PATH).await?;
        let cookie = session::session_cookie(response.headers());
        let body = response.text().await?;

        session::parse_logon_status(&body)?.into_result()?;
        match &cookie {
            Some(_) => debug!("Logged in to {} as {}", self.host, self.username),
            None => warn!("{} accepted the login but set no cookie", self.host),
        }
        self.cookie = cookie.clone();
        Ok(cookie)
    }

    async fn switch_infos(&mut self) -> Result<SwitchInfo> {
        if self.model.is_none()
            && let Err(err) = self.autodetect_model().await
        {
            debug!("Fetching without a detected model: {}", err);
        }
        if self.cookie.is_none() && self.login_cookie().await?.is_none() {
            return Err(SwitchError::LoginFailed(
                "no session cookie received".to_string(),
            ));
        }

        let mut info = SwitchInfo::new();

        let body = self.get_data_page(SYSTEM_INFO_PATH).await?;
        let block = page::extract_object(&body, "info_ds")?;
        info::add_system_info(&mut info, &block, self.model.map(|m| m.name))?;

        let body = self.get_data_page(PORT_STATISTICS_PATH).await?;
        let block = page::extract_object(&body, "all_info")?;
        let max_ports = page::extract_scalar(&body, "max_port_num")
            .ok()
            .and_then(|raw| page::parse_number(&raw))
            .and_then(|n| usize::try_from(n).ok());
        let seen = info::add_port_statistics(&mut info, &block, max_ports)?;
        if self.model.is_none() {
            self.ports = seen;
        } else if seen != self.ports {
            warn!(
                "{} reports {} ports, model says {}",
                self.host, seen, self.ports
            );
        }

        let body = self.get_data_page(VLAN_8021Q_PATH).await?;
        let block = page::extract_object(&body, "qvlan_ds")?;
        info::add_vlans(&mut info, &block, self.ports)?;

        debug!(
            "Fetched {} keys from {}: {}",
            info.keys().count(),
            self.host,
            serde_json::to_string(&info).unwrap_or_default()
        );
        Ok(info)
    }
}
