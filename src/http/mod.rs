//! # HTTP Module
//!
//! Backend REST plumbing shared by every feature: the base-URL bound
//! [`client::RequestClient`], the structured [`error::RequestError`], and the
//! per-resource [`request::ResourceRequest`] controller.

pub mod client;
pub mod error;
pub mod request;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ApiResponse, RequestClient, Transport, Verb};
pub use error::RequestError;
pub use request::{ApiContext, RequestMethod, RequestState, ResourceRequest};
