//! Error types for the Brickset API client.
//!
//! # Design
//! The remote API answers almost every failure with HTTP 200 and
//! `"status": "error"`, so the variants here classify the decoded envelope
//! rather than HTTP status codes. A bad key, bad login and an unknown set id
//! each get their own variant; everything else the remote rejects lands in
//! `InvalidRequest` with the remote message verbatim.
//!
//! Transport failures are not represented: a non-2xx status or a failed
//! round-trip is treated as unrecoverable and panics in the client.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by `ApiClient` calls.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The remote rejected the API key.
    #[error("the provided API key {0} was invalid")]
    InvalidApiKey(String),

    /// The remote rejected the username/password pair.
    #[error("login failed: {0}")]
    InvalidLoginCredentials(String),

    /// The remote reported `status: error` for a call.
    #[error("Brickset error was {0}")]
    InvalidRequest(String),

    /// A set-scoped lookup matched nothing.
    #[error("set id {0} was not found so is invalid")]
    InvalidSetId(String),

    /// The response body could not be decoded or lacked a required field.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The `params` object could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}
