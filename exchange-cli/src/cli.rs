use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use exchange_tester::{
    normalize_endpoint, resolve_catalog, Credentials, ExchangeConfig,
    PollGuard, ProtocolVersion,
};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Upload a catalog and import it
    Catalog,
    /// Fetch orders waiting for export
    Sale,
}

#[derive(Parser, Debug)]
#[clap(name = "exchange-cli")]
#[clap(
    about = "Test catalog import and order export of a storefront exchange \
             endpoint",
    long_about = None
)]
pub struct Cli {
    #[clap(
        value_parser = parse_endpoint,
        help = "Import url, can be site url or full url to import script"
    )]
    pub url: Url,

    #[clap(help = "Login")]
    pub login: String,

    #[clap(help = "Password")]
    pub password: String,

    #[clap(value_parser = parse_catalog, help = "Catalog with data for import")]
    pub catalog: Option<PathBuf>,

    #[clap(
        short,
        long,
        value_enum,
        default_value_t = Mode::Catalog,
        help = "Test mode"
    )]
    pub mode: Mode,

    #[clap(short, long, action, help = "Show more information in process")]
    pub verbose: bool,

    #[clap(long, action, help = "Use old protocol version")]
    pub old: bool,

    #[clap(
        long,
        value_name = "N",
        help = "Give up on a file after this many import requests"
    )]
    pub max_polls: Option<u64>,

    #[clap(
        long,
        value_name = "SECS",
        help = "Give up on a file after importing it for this long"
    )]
    pub poll_deadline: Option<u64>,

    #[clap(long, value_name = "SECS", help = "Timeout of a single request")]
    pub timeout: Option<u64>,
}

impl Cli {
    pub fn protocol(&self) -> ProtocolVersion {
        if self.old {
            ProtocolVersion::Legacy
        } else {
            ProtocolVersion::Versioned
        }
    }

    pub fn config(&self) -> ExchangeConfig {
        let config = ExchangeConfig::new(
            self.url.clone(),
            Credentials::new(&self.login, &self.password),
        )
        .with_protocol(self.protocol())
        .with_poll_guard(PollGuard {
            max_polls: self.max_polls,
            deadline: self.poll_deadline.map(Duration::from_secs),
        });

        match self.timeout {
            Some(secs) => config.with_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }
}

fn parse_endpoint(value: &str) -> Result<Url, String> {
    normalize_endpoint(value).map_err(|e| e.to_string())
}

fn parse_catalog(value: &str) -> Result<PathBuf, String> {
    resolve_catalog(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_exchange_script() {
        let cli = Cli::try_parse_from([
            "exchange-cli",
            "shop.local",
            "admin",
            "secret",
            "-m",
            "sale",
        ])
        .unwrap();
        assert_eq!(
            cli.url.as_str(),
            "http://shop.local/bitrix/admin/1c_exchange.php"
        );
        assert_eq!(cli.mode, Mode::Sale);
        assert_eq!(cli.catalog, None);
        assert_eq!(cli.protocol(), ProtocolVersion::Versioned);
    }

    #[test]
    fn catalog_mode_is_default() {
        let dir = std::env::temp_dir();
        let cli = Cli::try_parse_from([
            "exchange-cli",
            "https://shop.local",
            "admin",
            "secret",
            dir.to_str().unwrap(),
            "--old",
            "--max-polls",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.mode, Mode::Catalog);
        assert!(cli.catalog.is_some());

        let config = cli.config();
        assert_eq!(config.protocol, ProtocolVersion::Legacy);
        assert_eq!(config.poll_guard.max_polls, Some(10));
        assert_eq!(config.poll_guard.deadline, None);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn missing_catalog_is_rejected() {
        let result = Cli::try_parse_from([
            "exchange-cli",
            "shop.local",
            "admin",
            "secret",
            "/definitely/not/a/catalog",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let result = Cli::try_parse_from([
            "exchange-cli",
            "shop.local",
            "admin",
            "secret",
            "--mode",
            "orders",
        ]);
        assert!(result.is_err());
    }
}
