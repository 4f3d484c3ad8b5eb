//! # Authentication Module
//!
//! Client side of authentication: token claims decoding, the session state
//! machine, token persistence and the redirects that follow login and logout.

pub mod jwt;
pub mod models;
pub mod navigation;
pub mod session;
pub mod storage;

pub use models::{Role, Session, SessionPhase, UserIdentity};
pub use navigation::{Navigator, Route, RouteTracker};
pub use session::{SessionError, SessionHandle, SessionManager};
pub use storage::{FileTokenStore, MemoryTokenStore, StorageError, TokenStore};
