use std::fmt;

use reqwest::StatusCode;

use crate::{ExchangeError, Result};

const FAILURE_MARKER: &str = "failure";
const PROGRESS_MARKER: &str = "progress";

/// Request kinds of the exchange protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CheckAuth,
    Init,
    Upload,
    Import,
    Query,
    Success,
}

impl Step {
    pub fn mode(&self) -> &'static str {
        match self {
            Step::CheckAuth => "checkauth",
            Step::Init => "init",
            Step::Upload => "file",
            Step::Import => "import",
            Step::Query => "query",
            Step::Success => "success",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mode())
    }
}

/// Outcome of a reply that is not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Done,
    /// The server is still importing the file and wants the same request again
    Progress,
}

/// Decide what a server reply means for the given step.
///
/// Any status other than 200 or a body starting with `failure` aborts the
/// exchange. A body starting with `progress` is only meaningful for the
/// import step.
pub fn classify(step: Step, status: StatusCode, body: &str) -> Result<Reply> {
    log_response(body);

    if status != StatusCode::OK {
        return Err(match step {
            Step::CheckAuth if body.is_empty() => {
                ExchangeError::Authentication(status.to_string())
            }
            Step::CheckAuth => ExchangeError::Authentication(body.to_owned()),
            _ => ExchangeError::Transport {
                step,
                status,
                body: body.to_owned(),
            },
        });
    }

    if body.starts_with(FAILURE_MARKER) {
        return Err(match step {
            Step::CheckAuth => ExchangeError::Authentication(body.to_owned()),
            _ => ExchangeError::Protocol {
                step,
                body: body.to_owned(),
            },
        });
    }

    if step == Step::Import && body.starts_with(PROGRESS_MARKER) {
        Ok(Reply::Progress)
    } else {
        Ok(Reply::Done)
    }
}

/// Show the gist of a reply: servers put the verdict on the first line and
/// a human readable message on the last one.
pub fn log_response(body: &str) {
    let lines: Vec<&str> = body.lines().collect();
    match lines.as_slice() {
        [] => {}
        [single] => log::info!("{}", single),
        [first, .., last] => {
            log::debug!("{}", first);
            log::info!("{}", last);
        }
    }
}
