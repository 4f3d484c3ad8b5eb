//! Route tracking for login/logout redirects

use std::fmt;
use parking_lot::RwLock;
use tracing::info;

use crate::auth::models::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    ManagementHome,
    StudentHome,
    Other(String),
}

impl Route {
    pub fn path(&self) -> &str {
        match self {
            Route::Login => "/login",
            Route::ManagementHome => "/management/home",
            Route::StudentHome => "/student/home",
            Route::Other(path) => path,
        }
    }

    pub fn from_path(path: &str) -> Self {
        match path {
            "/login" => Route::Login,
            "/management/home" => Route::ManagementHome,
            "/student/home" => Route::StudentHome,
            other => Route::Other(other.to_string()),
        }
    }

    /// Landing page after login
    pub fn home_for(role: &Role) -> Self {
        match role {
            Role::Teacher { .. } => Route::ManagementHome,
            Role::Student { .. } => Route::StudentHome,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

pub trait Navigator: Send + Sync {
    fn current(&self) -> Route;
    fn navigate(&self, route: Route);
}

/// In-memory navigator that remembers every redirect
#[derive(Debug)]
pub struct RouteTracker {
    current: RwLock<Route>,
    history: RwLock<Vec<Route>>,
}

impl RouteTracker {
    pub fn new(initial: Route) -> Self {
        Self {
            current: RwLock::new(initial),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Move without recording a redirect, as when the user follows a link
    pub fn set_current(&self, route: Route) {
        *self.current.write() = route;
    }

    pub fn history(&self) -> Vec<Route> {
        self.history.read().clone()
    }

    /// How many redirects went to `route`
    pub fn visits(&self, route: &Route) -> usize {
        self.history.read().iter().filter(|r| *r == route).count()
    }
}

impl Navigator for RouteTracker {
    fn current(&self) -> Route {
        self.current.read().clone()
    }

    /// Redirecting to the route already shown is a no-op, so history only
    /// grows on actual moves
    fn navigate(&self, route: Route) {
        let mut current = self.current.write();
        if *current == route {
            return;
        }
        info!("Navigating to {}", route);
        self.history.write().push(route.clone());
        *current = route;
    }
}
