//! Authenticated HTTP transport.
//!
//! Every API request passes through [`AuthHttp::execute`]: it attaches the
//! stored bearer token, and when the backend answers 401 it runs the token
//! refresh flow and retries the request once with the new token. Refreshes
//! are single-flight: whichever request hits the 401 first leads the
//! episode, every other 401 from the same expiry waits on that episode's
//! outcome and replays with the one token it produced. An unrecoverable
//! 401 clears the session and sends the shell to the login page, and the
//! original response is returned unchanged so callers always see what the
//! wire produced.

use crate::api::common::{ApiResponse, read_envelope};
use crate::auth::models::{AuthResponse, RefreshTokenRequest};
use crate::errors::{ClientError, ClientResult};
use crate::routing::{LOGIN_ROUTE, Navigator};
use crate::session::SessionStore;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, Request, RequestBuilder, Response, StatusCode, Url};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Path of the token refresh endpoint, relative to the API base.
pub const REFRESH_TOKEN_PATH: &str = "auth/refresh-token";

/// How a refresh episode ended.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// New tokens are persisted; replay with this access token.
    Refreshed(String),
    /// The episode failed and the session is gone.
    Failed,
}

type EpisodeReceiver = watch::Receiver<Option<RefreshOutcome>>;

/// Serializes token refreshes.
///
/// At most one episode runs at a time. The first caller to begin an
/// episode leads it; everyone else joining before it settles becomes a
/// follower of that same episode.
#[derive(Clone, Default)]
pub struct RefreshCoordinator {
    episode: Arc<Mutex<Option<EpisodeReceiver>>>,
}

/// Role a caller plays in the current episode.
pub enum RefreshTicket {
    /// This caller performs the refresh and must settle the episode.
    Lead(RefreshGuard),
    /// Another caller is refreshing; wait for its outcome.
    Follower(RefreshWaiter),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the in-flight episode, or starts one if none is running.
    pub fn begin(&self) -> RefreshTicket {
        let mut slot = lock(&self.episode);
        if let Some(rx) = slot.as_ref() {
            return RefreshTicket::Follower(RefreshWaiter { rx: rx.clone() });
        }
        let (tx, rx) = watch::channel(None);
        *slot = Some(rx);
        RefreshTicket::Lead(RefreshGuard {
            tx,
            episode: Arc::clone(&self.episode),
            settled: false,
        })
    }
}

/// Settles the episode it leads.
///
/// Dropping the guard unsettled releases every waiter with a failure, so
/// a panicking leader can never wedge its followers.
pub struct RefreshGuard {
    tx: watch::Sender<Option<RefreshOutcome>>,
    episode: Arc<Mutex<Option<EpisodeReceiver>>>,
    settled: bool,
}

impl RefreshGuard {
    /// Ends the episode and releases every waiter with `outcome`.
    pub fn complete(mut self, outcome: RefreshOutcome) {
        self.settle(outcome);
    }

    fn settle(&mut self, outcome: RefreshOutcome) {
        if self.settled {
            return;
        }
        self.settled = true;
        // Retire the episode before waking waiters, so the next 401 starts
        // a fresh episode instead of joining a settled one.
        *lock(&self.episode) = None;
        let _ = self.tx.send(Some(outcome));
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.settle(RefreshOutcome::Failed);
    }
}

/// Waits for the episode's outcome. No lock is held while waiting.
pub struct RefreshWaiter {
    rx: EpisodeReceiver,
}

impl RefreshWaiter {
    pub async fn wait(mut self) -> RefreshOutcome {
        match self.rx.wait_for(|outcome| outcome.is_some()).await {
            Ok(value) => (*value).clone().unwrap_or(RefreshOutcome::Failed),
            // The guard settles on drop, so losing the sender means the
            // runtime is tearing down.
            Err(_) => RefreshOutcome::Failed,
        }
    }
}

fn lock(slot: &Mutex<Option<EpisodeReceiver>>) -> MutexGuard<'_, Option<EpisodeReceiver>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// HTTP transport that attaches the stored bearer and recovers expired
/// access tokens through the single-flight refresh flow.
///
/// Cheap to clone; clones share the connection pool, the session, the
/// navigator and the refresh coordinator.
#[derive(Clone)]
pub struct AuthHttp {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
    navigator: Navigator,
    coordinator: RefreshCoordinator,
}

impl AuthHttp {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        session: SessionStore,
        navigator: Navigator,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        AuthHttp {
            http,
            base_url,
            session,
            navigator,
            coordinator: RefreshCoordinator::new(),
        }
    }

    /// Absolute URL for a path relative to the API base.
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&raw).map_err(|err| ClientError::invalid_url(format!("{raw}: {err}")))
    }

    /// Builder on the shared pool. Requests built here still need
    /// [`AuthHttp::execute`] to get bearer and refresh handling.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url)
    }

    /// Raw client for the rare call that must bypass bearer handling.
    pub fn bare(&self) -> &reqwest::Client {
        &self.http
    }

    /// Sends a request with the stored bearer attached, recovering a 401
    /// through the refresh flow.
    ///
    /// The response comes back exactly as the wire produced it; envelope
    /// decoding belongs to the layer above. On an unrecoverable 401 the
    /// session is cleared, the shell is sent to the login page, and the
    /// original 401 is returned.
    pub async fn execute(&self, mut request: Request) -> ClientResult<Response> {
        // Multipart and streaming bodies cannot be cloned; such a request
        // cannot be replayed after a refresh.
        let retry = request.try_clone();

        if let Some(token) = self.session.access_token() {
            set_bearer(&mut request, &token)?;
        }

        let response = self.http.execute(request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        // A 401 from the refresh endpoint itself means the refresh token
        // is no good; refreshing again would loop.
        if is_refresh_endpoint(response.url()) {
            self.drop_session("refresh token rejected");
            return Ok(response);
        }

        match self.coordinator.begin() {
            RefreshTicket::Follower(waiter) => match waiter.wait().await {
                RefreshOutcome::Refreshed(token) => self.replay(retry, response, &token).await,
                RefreshOutcome::Failed => Ok(response),
            },
            RefreshTicket::Lead(guard) => self.lead_refresh(guard, retry, response).await,
        }
    }

    async fn lead_refresh(
        &self,
        guard: RefreshGuard,
        retry: Option<Request>,
        response: Response,
    ) -> ClientResult<Response> {
        let Some(refresh_token) = self.session.refresh_token() else {
            guard.complete(RefreshOutcome::Failed);
            self.drop_session("no refresh token stored");
            return Ok(response);
        };

        debug!("access token rejected, refreshing");
        match self.request_new_session(&refresh_token).await {
            Ok(auth) => {
                // The refreshed session is persisted wholesale before any
                // waiter is released, so every replay and every later
                // request reads the new pair.
                if let Err(err) = self.session.save(&auth) {
                    guard.complete(RefreshOutcome::Failed);
                    self.drop_session("could not persist refreshed session");
                    return Err(err);
                }
                guard.complete(RefreshOutcome::Refreshed(auth.access_token.clone()));
                self.replay(retry, response, &auth.access_token).await
            }
            Err(err) => {
                debug!("refresh attempt failed: {err}");
                guard.complete(RefreshOutcome::Failed);
                self.drop_session("token refresh failed");
                Ok(response)
            }
        }
    }

    /// Exactly one round-trip to the refresh endpoint, on the bare client
    /// so it can never recurse into the refresh flow.
    async fn request_new_session(&self, refresh_token: &str) -> ClientResult<AuthResponse> {
        let url = self.endpoint(REFRESH_TOKEN_PATH)?;
        let response = self
            .http
            .post(url)
            .json(&RefreshTokenRequest {
                refresh_token: refresh_token.to_string(),
            })
            .send()
            .await?;
        let envelope = read_envelope::<ApiResponse<AuthResponse>>(response).await?;
        Ok(envelope.data)
    }

    /// One retry with the refreshed token; its response is final whatever
    /// the status. A body that could not be cloned leaves the original
    /// response as the answer.
    async fn replay(
        &self,
        retry: Option<Request>,
        original: Response,
        token: &str,
    ) -> ClientResult<Response> {
        let Some(mut request) = retry else {
            return Ok(original);
        };
        set_bearer(&mut request, token)?;
        Ok(self.http.execute(request).await?)
    }

    /// Ends the local session and sends the shell to the login page.
    fn drop_session(&self, reason: &str) {
        warn!("dropping session: {reason}");
        if let Err(err) = self.session.clear() {
            warn!("session clear failed: {err}");
        }
        self.navigator.navigate(LOGIN_ROUTE);
    }
}

fn set_bearer(request: &mut Request, token: &str) -> ClientResult<()> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
        ClientError::validation("stored access token is not a valid header value")
    })?;
    value.set_sensitive(true);
    request.headers_mut().insert(AUTHORIZATION, value);
    Ok(())
}

/// The refresh endpoint must never trigger another refresh.
fn is_refresh_endpoint(url: &Url) -> bool {
    url.path()
        .trim_end_matches('/')
        .ends_with("/auth/refresh-token")
}
