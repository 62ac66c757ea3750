use std::{path::StripPrefixError, string::FromUtf8Error};

use reqwest::StatusCode;
use thiserror::Error;

use crate::response::Step;

pub type Result<T> = std::result::Result<T, ExchangeError>;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Step {step} failed: {body}")]
    Protocol { step: Step, body: String },
    #[error("{0}")]
    Input(String),
    #[error("Step {step} returned HTTP {status}: {body}")]
    Transport {
        step: Step,
        status: StatusCode,
        body: String,
    },
    #[error("Import of {file} still in progress after {polls} polls")]
    PollLimit { file: String, polls: u64 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Parsing error")]
    Parse,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExchangeError {
    /// Raw server reply attached to the failure, if the failure came from one
    pub fn body(&self) -> Option<&str> {
        match self {
            ExchangeError::Protocol { body, .. }
            | ExchangeError::Transport { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<FromUtf8Error> for ExchangeError {
    fn from(_: FromUtf8Error) -> Self {
        Self::Parse
    }
}

impl From<StripPrefixError> for ExchangeError {
    fn from(value: StripPrefixError) -> Self {
        Self::Other(anyhow::anyhow!(value.to_string()))
    }
}
