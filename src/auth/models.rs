//! Authentication Models
//!
//! Session state, the user identity carried in token claims, and login payloads.

use serde::{Deserialize, Serialize};

/// Role-specific part of a user identity, tagged by the `role` claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "UPPERCASE")]
pub enum Role {
    Teacher {
        #[serde(default)]
        manager: bool,
    },
    Student {
        code: String,
        classroom_id: String,
    },
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Teacher { .. } => "TEACHER",
            Role::Student { .. } => "STUDENT",
        }
    }

    pub fn is_teacher(&self) -> bool {
        matches!(self, Role::Teacher { .. })
    }
}

/// Current user, derived from token claims and replaced wholesale on every new token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub last_name: String,
    pub phone: String,
    pub birth_date: String,
    #[serde(flatten)]
    pub role: Role,
}

impl UserIdentity {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name)
    }
}

/// Claims the session reads from a token payload
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiry, epoch seconds; a token without one never expires
    #[serde(default)]
    pub exp: Option<f64>,
    #[serde(flatten)]
    pub user: UserIdentity,
}

impl TokenClaims {
    pub fn is_expired_at(&self, now_secs: f64) -> bool {
        self.exp.is_some_and(|exp| exp < now_secs)
    }
}

/// Client-side view of the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    /// Set once the startup token check has run
    pub verified: bool,
    pub user: Option<UserIdentity>,
}

/// Where a session stands in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unverified,
    Anonymous,
    Authenticated,
}

impl Session {
    pub fn phase(&self) -> SessionPhase {
        if self.token.is_some() && self.user.is_some() {
            SessionPhase::Authenticated
        } else if self.verified {
            SessionPhase::Anonymous
        } else {
            SessionPhase::Unverified
        }
    }
}

/// Login request payload
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token response after successful authentication
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}
