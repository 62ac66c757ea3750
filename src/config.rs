use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use url::Url;

use crate::protocol::ProtocolVersion;

pub const DEFAULT_USER_AGENT: &str = "1C Tester";
pub const DEFAULT_ACCEPT_ENCODING: &str = "deflate";
pub const DEFAULT_ARCHIVE_NAME: &str = "catalog.zip";

/// Login and password for HTTP basic authentication of `checkauth`.
#[derive(Clone)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new<L, P>(login: L, password: P) -> Self
    where
        L: Into<String>,
        P: Into<String>,
    {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

/// Bounds on re-polling a file the server keeps reporting as in progress.
///
/// Unbounded unless configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollGuard {
    pub max_polls: Option<u64>,
    pub deadline: Option<Duration>,
}

impl PollGuard {
    pub fn unbounded() -> Self {
        Self::default()
    }
}

/// Everything a session needs to talk to one exchange endpoint.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub endpoint: Url,
    pub credentials: Credentials,
    pub protocol: ProtocolVersion,
    pub user_agent: String,
    pub accept_encoding: String,
    pub archive_name: String,
    pub timeout: Option<Duration>,
    pub poll_guard: PollGuard,
}

impl ExchangeConfig {
    pub fn new(endpoint: Url, credentials: Credentials) -> Self {
        Self {
            endpoint,
            credentials,
            protocol: ProtocolVersion::default(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            accept_encoding: DEFAULT_ACCEPT_ENCODING.to_owned(),
            archive_name: DEFAULT_ARCHIVE_NAME.to_owned(),
            timeout: None,
            poll_guard: PollGuard::unbounded(),
        }
    }

    pub fn with_protocol(mut self, protocol: ProtocolVersion) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_poll_guard(mut self, poll_guard: PollGuard) -> Self {
        self.poll_guard = poll_guard;
        self
    }

    pub fn with_archive_name<S: Into<String>>(mut self, name: S) -> Self {
        self.archive_name = name.into();
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Headers sent with every request of the session
    pub fn headers(&self) -> crate::Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent)
                .map_err(|e| anyhow::anyhow!("Invalid user agent: {}", e))?,
        );
        let encoding = HeaderValue::from_str(&self.accept_encoding)
            .map_err(|e| anyhow::anyhow!("Invalid accept encoding: {}", e))?;
        headers.insert(ACCEPT_ENCODING, encoding);
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ExchangeConfig {
        let endpoint = "http://shop.local/bitrix/admin/1c_exchange.php";
        let endpoint = Url::parse(endpoint).unwrap();
        ExchangeConfig::new(endpoint, Credentials::new("admin", "secret"))
    }

    #[test]
    fn defaults_match_exchange_conventions() {
        let config = config();
        assert_eq!(config.protocol, ProtocolVersion::Versioned);
        assert_eq!(config.archive_name, "catalog.zip");
        assert_eq!(config.poll_guard, PollGuard::unbounded());
        assert_eq!(config.timeout, None);

        let headers = config.headers().unwrap();
        assert_eq!(headers[USER_AGENT], "1C Tester");
        assert_eq!(headers[ACCEPT_ENCODING], "deflate");
    }

    #[test]
    fn password_is_not_printed() {
        let printed = format!("{:?}", config());
        assert!(printed.contains("admin"));
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = config()
            .with_protocol(ProtocolVersion::Legacy)
            .with_archive_name("upload.zip")
            .with_timeout(Duration::from_secs(30));
        assert_eq!(config.protocol, ProtocolVersion::Legacy);
        assert_eq!(config.archive_name, "upload.zip");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn invalid_header_value_is_rejected() {
        let config = config().with_user_agent("bad\nagent");
        assert!(config.headers().is_err());
    }
}
