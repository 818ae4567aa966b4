//! Outbound HTTP for the relying party.
//!
//! # Overview
//!
//! - [`build_http_client`]: The shared `reqwest::Client` with a bounded timeout
//! - [`ResourceClient`]: Authenticated `GET` of the protected resource
//! - [`render_payload`]: Pretty JSON with sorted keys
//! - [`HttpError`]: Unified error type for outbound calls
//!
//! # Example
//!
//! ```rust,ignore
//! use oauth_relying_party::clients::{build_http_client, ResourceClient};
//!
//! let http = build_http_client(&config)?;
//! let resources = ResourceClient::new(http, config.resource_endpoint());
//! let payload = resources.fetch(&token).await?;
//! ```
//!
//! No request is retried. Failures are returned to the caller immediately.

mod errors;
mod http_client;

pub use errors::{HttpError, HttpResponseError};
pub use http_client::{build_http_client, render_payload, ResourceClient, CLIENT_VERSION};
