//! Blocking client for the Brickset v3 catalog API.
//!
//! # Overview
//! Wraps the set, theme and minifig endpoints of Brickset's form-encoded
//! API behind typed methods. Authentication is an API key, checked when the
//! client is built, plus an optional user login whose session hash is sent
//! to user-scoped endpoints.
//!
//! # Design
//! - `ApiClient` builds `HttpRequest` values (`build_*`), posts them through
//!   a `Transport`, and classifies the decoded envelope into a payload or an
//!   `Error`.
//! - Classification lives in `response` as pure functions so it can be
//!   tested without a client.
//! - Optional parameters are explicit structs in `params`; unset fields go
//!   over the wire as `""`.
//! - `UreqTransport` is the default transport; tests substitute their own.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod response;
pub mod types;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use http::{HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
pub use params::{
    GetSetsParams, MinifigCollectionParams, MinifigCollectionUpdate, OrderBy, SetCollectionParams,
    SortKey,
};
pub use types::{
    AdditionalImage, Instruction, Minifig, Review, ReviewRating, Set, SetCollection,
    SetCollections, SetImage, Subtheme, Theme, UserMinifigNote, UserNote, Year,
};
