//! Test doubles shared by the unit tests: a scripted transport and token minting.

use std::collections::VecDeque;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use parking_lot::Mutex;
use reqwest::header::HeaderMap;
use serde_json::{Value, json};
use tokio::sync::oneshot;

use crate::auth::navigation::{Route, RouteTracker};
use crate::auth::session::SessionHandle;
use crate::auth::storage::MemoryTokenStore;
use crate::http::client::{ApiResponse, Transport, Verb};
use crate::http::error::RequestError;

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub verb: Verb,
    pub path: String,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

enum Reply {
    Ready(Result<Value, RequestError>),
    Gated(oneshot::Receiver<Result<Value, RequestError>>),
}

/// Answers requests from a queue, in call order
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply_ok(&self, data: Value) {
        self.replies.lock().push_back(Reply::Ready(Ok(data)));
    }

    pub fn reply_err(&self, err: RequestError) {
        self.replies.lock().push_back(Reply::Ready(Err(err)));
    }

    /// The matching call stays pending until `rx` fires
    pub fn reply_when(&self, rx: oneshot::Receiver<Result<Value, RequestError>>) {
        self.replies.lock().push_back(Reply::Gated(rx));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub async fn wait_for_calls(&self, count: usize) {
        while self.calls.lock().len() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        verb: Verb,
        path: &str,
        body: Option<&Value>,
        headers: &HeaderMap,
    ) -> Result<ApiResponse, RequestError> {
        let reply = self.replies.lock().pop_front();
        self.calls.lock().push(RecordedCall {
            verb,
            path: path.to_string(),
            body: body.cloned(),
            headers: headers.clone(),
        });

        let result = match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(RequestError::Network("reply dropped".into()))),
            None => Err(RequestError::Network(format!("no scripted reply for {} {}", verb, path))),
        };

        result.map(|data| ApiResponse { status: 200, data })
    }
}

/// In-memory session sitting on the login view
pub(crate) fn test_session() -> (SessionHandle, Arc<RouteTracker>) {
    let routes = Arc::new(RouteTracker::new(Route::Login));
    let session = SessionHandle::new(Arc::new(MemoryTokenStore::default()), routes.clone());
    (session, routes)
}

pub(crate) fn teacher_claims() -> Value {
    json!({
        "sub": "t-1",
        "id": "t-1",
        "email": "a@b.com",
        "name": "Ana",
        "last_name": "Souza",
        "phone": "11999990000",
        "birth_date": "1990-04-12",
        "role": "TEACHER",
        "manager": true
    })
}

pub(crate) fn student_claims() -> Value {
    json!({
        "sub": "s-9",
        "id": "s-9",
        "email": "bia@escola.com",
        "name": "Bia",
        "last_name": "Lima",
        "phone": "11988887777",
        "birth_date": "2011-09-01",
        "role": "STUDENT",
        "code": "ST-0042",
        "classroom_id": "c-3"
    })
}

pub(crate) fn mint_token(claims: &Value) -> String {
    jsonwebtoken::encode(&Header::default(), claims, &EncodingKey::from_secret(b"test-secret")).unwrap()
}

pub(crate) fn token_expiring_at(mut claims: Value, exp: i64) -> String {
    claims["exp"] = json!(exp);
    mint_token(&claims)
}

pub(crate) fn future_token(claims: Value) -> String {
    token_expiring_at(claims, Utc::now().timestamp() + 3600)
}

pub(crate) fn expired_token(claims: Value) -> String {
    token_expiring_at(claims, Utc::now().timestamp() - 60)
}
