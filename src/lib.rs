//! # SustentaTech Client
//!
//! Client core for the SustentaTech school-management backend: a base-URL
//! bound HTTP client, per-resource request controllers with observable
//! `{data, error, loading}` state, and the authentication session that
//! injects bearer tokens and ends itself when the backend rejects them.
//!
//! ## Architecture
//! - `config`: environment variable configuration
//! - `http`: request client, error taxonomy, resource request controllers
//! - `auth`: token claims decoding, session lifecycle, token storage, redirects
//! - `resources`: backend resource paths and the notification feed

pub mod auth;
pub mod config;
pub mod http;
pub mod resources;

pub use auth::{SessionHandle, SessionManager};
pub use config::Config;
pub use http::{ApiContext, RequestClient, RequestError, RequestMethod, ResourceRequest};
