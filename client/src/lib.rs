//! Client core of the FretesJá freight marketplace.
//!
//! This crate is the part of the client that talks to the FretesJá API:
//! the durable session store, the authenticated HTTP transport with its
//! single-flight token refresh, the role-based route gate, and the typed
//! auth flows (login, registration, password recovery, logout). A UI
//! shell embeds [`FretesJa`], drains its navigation stream, and calls the
//! API through [`api::ApiClient`].

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod routing;
pub mod session;

use crate::api::client::ApiClient;
use crate::auth::interceptor::AuthHttp;
use crate::auth::service::AuthService;
use crate::config::Config;
use crate::routing::Navigator;
use crate::session::{FileStorage, SessionStore};
use anyhow::Context;
use tokio::sync::mpsc::UnboundedReceiver;

/// Assembled client: one shared transport, the session and auth surfaces,
/// and the navigation stream the embedding shell drains.
pub struct FretesJa {
    pub api: ApiClient,
    pub auth: AuthService,
    pub session: SessionStore,
    pub navigation: UnboundedReceiver<String>,
}

impl FretesJa {
    /// Builds the client from explicit configuration.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let storage = FileStorage::open(&config.session_file).with_context(|| {
            format!(
                "cannot open session file {}",
                config.session_file.display()
            )
        })?;
        let session = SessionStore::open(storage);
        let (navigator, navigation) = Navigator::channel();

        // No request timeout here: the user sees failures when the API
        // answers with one, not when a local timer fires.
        let transport = AuthHttp::new(
            reqwest::Client::new(),
            config.api_base_url.as_str(),
            session.clone(),
            navigator.clone(),
        );
        let api = ApiClient::new(transport);
        let auth = AuthService::new(api.clone(), session.clone(), navigator);

        Ok(FretesJa {
            api,
            auth,
            session,
            navigation,
        })
    }

    /// Builds the client from environment configuration.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(&Config::from_env()?)
    }
}
