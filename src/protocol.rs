use once_cell::sync::Lazy;
use regex::Regex;

use crate::{ExchangeError, Result};

/// Protocol version tag sent with every request of a versioned session
pub const ACTUAL_VERSION: &str = "3.1";

static SESSION_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new("sessid=([a-z0-9]+)").expect("session id pattern is valid")
});

/// Exchange protocol flavour requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolVersion {
    /// No version or session parameters are ever sent
    Legacy,
    #[default]
    Versioned,
}

impl ProtocolVersion {
    /// Settle the protocol for a session using the reply to `checkauth`.
    ///
    /// The versioned protocol requires the server to hand out a session id;
    /// a reply without one means the server does not speak that version.
    pub fn negotiate(&self, checkauth_reply: &str) -> Result<Negotiated> {
        match self {
            ProtocolVersion::Legacy => Ok(Negotiated::Legacy),
            ProtocolVersion::Versioned => {
                let session_id = extract_session_id(checkauth_reply)
                    .ok_or_else(|| {
                        ExchangeError::Authentication(
                            "Selected new protocol version, but sessid not set"
                                .to_owned(),
                        )
                    })?;
                log::debug!("Session id {}", session_id);
                Ok(Negotiated::Versioned {
                    version: ACTUAL_VERSION.to_owned(),
                    session_id,
                })
            }
        }
    }
}

/// Protocol fixed for the lifetime of an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Negotiated {
    Legacy,
    Versioned { version: String, session_id: String },
}

impl Negotiated {
    /// Extra query parameters attached to every request after `checkauth`
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        match self {
            Negotiated::Legacy => Vec::new(),
            Negotiated::Versioned {
                version,
                session_id,
            } => vec![
                ("version", version.as_str()),
                ("sessid", session_id.as_str()),
            ],
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            Negotiated::Legacy => None,
            Negotiated::Versioned { session_id, .. } => Some(session_id),
        }
    }
}

pub fn extract_session_id(text: &str) -> Option<String> {
    SESSION_ID
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_owned())
}
