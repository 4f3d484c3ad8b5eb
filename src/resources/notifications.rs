//! Notification Feed
//!
//! Keeps the signed-in user's notification list fresh by polling while a
//! session token is present, and marks single notifications as read.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::auth::session::SessionHandle;
use crate::http::error::RequestError;
use crate::http::request::{ApiContext, RequestMethod, ResourceRequest};
use crate::resources::paths;

/// Shortest polling period; `tokio::time::interval` rejects zero
const MIN_POLL_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub account_id: String,
    pub message: String,
    pub url: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

pub struct NotificationFeed {
    session: SessionHandle,
    list: ResourceRequest<Vec<Notification>>,
    mark_read: ResourceRequest<Value>,
    /// Last known list length; survives failed refreshes
    count: AtomicUsize,
}

impl NotificationFeed {
    pub fn new(context: &ApiContext) -> Self {
        Self {
            session: context.session.clone(),
            list: context.resource(paths::NOTIFICATION),
            mark_read: context.resource(paths::NOTIFICATION_MARK_AS_READ),
            count: AtomicUsize::new(0),
        }
    }

    pub fn notifications(&self) -> Option<Vec<Notification>> {
        self.list.data()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn is_loading(&self) -> bool {
        self.list.loading()
    }

    pub fn is_marking_as_read(&self) -> bool {
        self.mark_read.loading()
    }

    pub async fn refresh(&self) -> Result<Vec<Notification>, RequestError> {
        let notifications = self.list.fetch(RequestMethod::Get).await?;
        self.count.store(notifications.len(), Ordering::Relaxed);
        debug!("{} notifications", notifications.len());
        Ok(notifications)
    }

    /// Mark one notification as read, then reload the list
    pub async fn mark_as_read(&self, id: &str) -> Result<(), RequestError> {
        self.mark_read
            .fetch(RequestMethod::Post(json!({ "ids": [id] })))
            .await?;
        info!("Notification {} marked as read", id);

        if let Err(e) = self.refresh().await {
            warn!("Failed to reload notifications: {}", e);
        }
        Ok(())
    }

    /// Refresh every `period` until the session loses its token.
    ///
    /// The first refresh happens immediately. A zero period is raised to 1ms.
    pub async fn poll(&self, period: Duration) {
        let mut ticker = interval(period.max(MIN_POLL_PERIOD));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if self.session.auth_token().is_none() {
                info!("No active session, notification polling stopped");
                break;
            }
            if let Err(e) = self.refresh().await {
                warn!("Failed to fetch notifications: {}", e);
            }
        }
    }

    pub fn spawn_polling(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let feed = Arc::clone(self);
        tokio::spawn(async move { feed.poll(period).await })
    }
}
