//! Process exit codes.

use std::process::ExitCode;

use nwkit_common_config::ConfigError;
use nwkit_http::{NwError, ResponseStatus};

/// Application exit codes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success = 0,
    GeneralError = 1,
    ConfigError = 2,
    IoError = 3,
    NetworkError = 4,
    /// The server answered with a non-success status.
    HttpError = 5,
    Interrupted = 130,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

impl Exit {
    /// Pick the exit code for a failed run.
    pub fn for_error(err: &anyhow::Error) -> Self {
        if let Some(err) = err.downcast_ref::<NwError>() {
            return Self::for_request_error(err);
        }
        if err.downcast_ref::<ConfigError>().is_some() {
            return Self::ConfigError;
        }
        if err.downcast_ref::<std::io::Error>().is_some() {
            return Self::IoError;
        }
        Self::GeneralError
    }

    fn for_request_error(err: &NwError) -> Self {
        if err.is_cancelled() {
            Self::Interrupted
        } else if err.status == ResponseStatus::TRANSPORT_FAILURE {
            Self::NetworkError
        } else if err.status.is_library_code() {
            Self::GeneralError
        } else {
            Self::HttpError
        }
    }
}
