//! Resource Request Controller
//!
//! Binds one backend resource path to a `{data, error, loading}` state and a
//! `fetch` action. Every call carries the session's current bearer token and
//! reports failures twice: in the stored state for passive observers and in
//! the returned `Result` for the caller.
//!
//! Calls on the same controller are not sequenced. If two fetches overlap,
//! whichever response resolves last owns `data`.

use std::sync::Arc;
use parking_lot::Mutex;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::session::SessionHandle;
use crate::http::client::{Transport, Verb};
use crate::http::error::RequestError;

/// How a fetch talks to its resource
#[derive(Debug, Clone, PartialEq)]
pub enum RequestMethod {
    Get,
    Post(Value),
    Put(Value),
    Patch(Value),
    /// Targets `<path>/<id>`
    Delete { id: String },
}

impl RequestMethod {
    pub fn post<B: Serialize>(body: &B) -> Result<Self, RequestError> {
        Ok(Self::Post(to_body(body)?))
    }

    pub fn put<B: Serialize>(body: &B) -> Result<Self, RequestError> {
        Ok(Self::Put(to_body(body)?))
    }

    pub fn patch<B: Serialize>(body: &B) -> Result<Self, RequestError> {
        Ok(Self::Patch(to_body(body)?))
    }

    pub fn delete(id: impl Into<String>) -> Self {
        Self::Delete { id: id.into() }
    }

    pub fn verb(&self) -> Verb {
        match self {
            Self::Get => Verb::Get,
            Self::Post(_) => Verb::Post,
            Self::Put(_) => Verb::Put,
            Self::Patch(_) => Verb::Patch,
            Self::Delete { .. } => Verb::Delete,
        }
    }
}

fn to_body<B: Serialize>(body: &B) -> Result<Value, RequestError> {
    serde_json::to_value(body).map_err(|e| RequestError::Encode(e.to_string()))
}

/// Observable state of one controller
#[derive(Debug, Clone, PartialEq)]
pub struct RequestState<T> {
    pub data: Option<T>,
    pub error: Option<RequestError>,
    pub loading: bool,
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: false,
        }
    }
}

/// Headers sent with every request: JSON content type plus the bearer token when present
pub fn request_headers(token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(token) = token {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("Auth token contains characters not allowed in a header, sending without it"),
        }
    }

    headers
}

/// Transport plus session: everything a controller needs besides its path
#[derive(Clone)]
pub struct ApiContext {
    pub transport: Arc<dyn Transport>,
    pub session: SessionHandle,
}

impl ApiContext {
    pub fn new(transport: Arc<dyn Transport>, session: SessionHandle) -> Self {
        Self { transport, session }
    }

    /// Controller bound to `path`
    pub fn resource<T>(&self, path: impl Into<String>) -> ResourceRequest<T> {
        ResourceRequest::new(path, self.transport.clone(), self.session.clone())
    }
}

pub struct ResourceRequest<T> {
    path: String,
    transport: Arc<dyn Transport>,
    session: SessionHandle,
    state: Arc<Mutex<RequestState<T>>>,
}

// Clones share one state.
impl<T> Clone for ResourceRequest<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            transport: self.transport.clone(),
            session: self.session.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T> ResourceRequest<T> {
    pub fn new(path: impl Into<String>, transport: Arc<dyn Transport>, session: SessionHandle) -> Self {
        Self {
            path: path.into(),
            transport,
            session,
            state: Arc::new(Mutex::new(RequestState::default())),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn error(&self) -> Option<RequestError> {
        self.state.lock().error.clone()
    }

    pub fn has_error(&self) -> bool {
        self.state.lock().error.is_some()
    }
}

impl<T> ResourceRequest<T>
where
    T: DeserializeOwned + Clone + Send,
{
    pub fn data(&self) -> Option<T> {
        self.state.lock().data.clone()
    }

    pub fn state(&self) -> RequestState<T> {
        self.state.lock().clone()
    }

    /// Issue `method` against this resource.
    ///
    /// On success the decoded body replaces `data` and is returned. On
    /// failure the error is stored and returned; an auth failure also ends
    /// the session before returning.
    pub async fn fetch(&self, method: RequestMethod) -> Result<T, RequestError> {
        {
            let mut state = self.state.lock();
            state.error = None;
            state.loading = true;
        }

        let headers = request_headers(self.session.auth_token().as_deref());

        let result = match &method {
            RequestMethod::Get => {
                self.transport.send(Verb::Get, &self.path, None, &headers).await
            }
            RequestMethod::Post(body) | RequestMethod::Put(body) | RequestMethod::Patch(body) => {
                self.transport
                    .send(method.verb(), &self.path, Some(body), &headers)
                    .await
            }
            RequestMethod::Delete { id } => {
                let target = format!("{}/{}", self.path, id);
                self.transport.send(Verb::Delete, &target, None, &headers).await
            }
        };

        let outcome = result.and_then(|response| {
            serde_json::from_value::<T>(response.data).map_err(|e| RequestError::Decode(e.to_string()))
        });

        match outcome {
            Ok(data) => {
                let mut state = self.state.lock();
                state.data = Some(data.clone());
                state.loading = false;
                debug!("{} {} resolved", method.verb(), self.path);
                Ok(data)
            }
            Err(err) => {
                {
                    let mut state = self.state.lock();
                    state.error = Some(err.clone());
                    state.loading = false;
                }

                if err.is_auth_failure() {
                    warn!("{} {} rejected the session ({}), logging out", method.verb(), self.path, err.message());
                    self.session.logout();
                } else {
                    debug!("{} {} failed: {}", method.verb(), self.path, err);
                }

                Err(err)
            }
        }
    }
}
