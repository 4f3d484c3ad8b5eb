//! # Resources Module
//!
//! Backend resource paths and the feature services built on them.

pub mod notifications;
pub mod paths;

pub use notifications::{Notification, NotificationFeed};
