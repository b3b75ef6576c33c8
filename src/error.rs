// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{io, result};

use thiserror::Error;
use tokio::sync::watch;

pub(crate) type Result<T, E = Error> = result::Result<T, E>;

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("JSON format error: {0}")]
    Json(serde_json::Error),
    #[error("authentication error: {0}")]
    Auth(#[from] Auth),
    #[error("authorization error: {0}")]
    Authorization(#[from] Authorization),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("internal communication error: {0}")]
    Internal(#[from] Internal),
    #[error("timed out waiting for the session to change")]
    Timeout,
    #[error("session gate has already been initialized")]
    AlreadyInitialized,
    #[error("no documents are staged for analysis")]
    NothingToAnalyze,
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(clippy::wildcard_enum_match_arm)]
        match value.classify() {
            serde_json::error::Category::Io => Self::Io(value.into()),
            _ => Self::Json(value),
        }
    }
}

/// A failure at the boundary with the authentication service. None of these
/// are fatal; the user may simply try again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Auth {
    #[error("identity provider rejected the request: {0}")]
    Rejected(String),
    #[error("could not initiate sign-in redirect: {0}")]
    Redirect(String),
    #[error("authentication service is unavailable: {0}")]
    Unavailable(String),
    #[error("authentication service is misconfigured: {0}")]
    Misconfigured(String),
}

impl From<Error> for Auth {
    fn from(value: Error) -> Self {
        match value {
            Error::Auth(e) => e,
            other => Self::Unavailable(other.to_string()),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Authorization {
    #[error("you must sign in before doing that")]
    NotAuthenticated,
}

#[derive(Error, Debug)]
pub(crate) enum Internal {
    #[error("channel is closed")]
    ChannelClosed,
}

impl From<watch::error::RecvError> for Internal {
    fn from(_: watch::error::RecvError) -> Self {
        Self::ChannelClosed
    }
}
