use std::env::current_dir;
use std::path::{Path, PathBuf};

use url::Url;

use crate::{ExchangeError, Result};

pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_PATH: &str = "/bitrix/admin/1c_exchange.php";

const SCHEME_SEPARATOR: &str = "://";

/// Turn a site address or a full script url into the exchange endpoint.
///
/// The scheme defaults to `http` and an empty path to the well-known
/// exchange script. Query and fragment are dropped.
pub fn normalize_endpoint(value: &str) -> Result<Url> {
    let value = value.trim();
    if value.is_empty() {
        return Err(not_url(value));
    }

    let mut url = if value.contains(SCHEME_SEPARATOR) {
        Url::parse(value)
    } else {
        Url::parse(&format!("{}{}{}", DEFAULT_SCHEME, SCHEME_SEPARATOR, value))
    }
    .map_err(|_| not_url(value))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(not_url(value));
    }

    if url.path().is_empty() || url.path() == "/" {
        url.set_path(DEFAULT_PATH);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Resolve a user supplied catalog path to an existing absolute directory.
pub fn resolve_catalog<P: AsRef<Path>>(value: P) -> Result<PathBuf> {
    let value = value.as_ref();
    let expanded = expand_home(value);
    let catalog = if expanded.is_absolute() {
        expanded
    } else {
        current_dir()?.join(expanded)
    };

    if catalog.is_dir() {
        Ok(catalog)
    } else {
        Err(ExchangeError::Input(format!(
            "[{}] is not catalog",
            catalog.display()
        )))
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match home::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

fn not_url(value: &str) -> ExchangeError {
    ExchangeError::Input(format!("<{}> is not properly url", value))
}
