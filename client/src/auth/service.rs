//! Auth endpoint flows.
//!
//! Login, registration, password recovery and logout over the typed API
//! client. Payloads are validated before any network call; successful
//! sign-ins persist the session; logout clears locally first and revokes
//! on the backend without blocking the caller.

use crate::api::client::ApiClient;
use crate::auth::models::{
    AuthResponse, CurrentUser, ForgotPasswordRequest, LoginRequest, RegisterCarrierRequest,
    RegisterTruckerRequest, ResetPasswordRequest,
};
use crate::errors::{ClientError, ClientResult};
use crate::routing::{self, HOME_ROUTE, LOGIN_ROUTE, Navigator};
use crate::session::SessionStore;
use tracing::{debug, info};
use validator::Validate;

/// Authentication flows for the FretesJá client.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    session: SessionStore,
    navigator: Navigator,
}

impl AuthService {
    pub fn new(api: ApiClient, session: SessionStore, navigator: Navigator) -> Self {
        AuthService {
            api,
            session,
            navigator,
        }
    }

    /// Authenticates and persists the session.
    pub async fn login(&self, request: LoginRequest) -> ClientResult<CurrentUser> {
        validate(&request)?;
        let response = self
            .api
            .post::<AuthResponse, _>("auth/login", &request)
            .await?;
        let auth = response.data;
        self.session.save(&auth)?;
        info!("signed in as {}", auth.user.email);
        Ok(auth.user)
    }

    /// Registers a trucker account and signs it in.
    pub async fn register_trucker(
        &self,
        request: RegisterTruckerRequest,
    ) -> ClientResult<CurrentUser> {
        validate(&request)?;
        let response = self
            .api
            .post::<AuthResponse, _>("auth/register/trucker", &request)
            .await?;
        let auth = response.data;
        self.session.save(&auth)?;
        info!("registered trucker {}", auth.user.email);
        Ok(auth.user)
    }

    /// Registers a carrier account and signs it in.
    pub async fn register_carrier(
        &self,
        request: RegisterCarrierRequest,
    ) -> ClientResult<CurrentUser> {
        validate(&request)?;
        let response = self
            .api
            .post::<AuthResponse, _>("auth/register/carrier", &request)
            .await?;
        let auth = response.data;
        self.session.save(&auth)?;
        info!("registered carrier {}", auth.user.email);
        Ok(auth.user)
    }

    /// Requests a password recovery email.
    pub async fn forgot_password(&self, email: impl Into<String>) -> ClientResult<()> {
        let request = ForgotPasswordRequest {
            email: email.into(),
        };
        validate(&request)?;
        self.api
            .post::<serde_json::Value, _>("auth/forgot-password", &request)
            .await?;
        Ok(())
    }

    /// Sets a new password using the token from the recovery email.
    pub async fn reset_password(
        &self,
        token: impl Into<String>,
        new_password: impl Into<String>,
    ) -> ClientResult<()> {
        let request = ResetPasswordRequest {
            token: token.into(),
            new_password: new_password.into(),
        };
        validate(&request)?;
        self.api
            .post::<serde_json::Value, _>("auth/reset-password", &request)
            .await?;
        Ok(())
    }

    /// Signs out immediately: the local session is gone and the shell is
    /// on its way to the login page before the revocation call settles.
    pub async fn logout(&self) -> ClientResult<()> {
        let token = self.session.access_token();
        self.session.clear()?;
        self.navigator.navigate(LOGIN_ROUTE);
        info!("signed out");

        if let Some(token) = token {
            // Fire-and-forget revocation, on the bare client: a 401 here
            // must not start a refresh for a session that no longer exists.
            let http = self.api.transport().bare().clone();
            let url = self.api.transport().endpoint("auth/logout")?;
            tokio::spawn(async move {
                if let Err(err) = http.post(url).bearer_auth(token).send().await {
                    debug!("logout revocation failed: {err}");
                }
            });
        }

        Ok(())
    }

    /// Sends the shell to the signed-in role's landing page.
    pub fn redirect_after_login(&self) {
        let target = match self.session.role() {
            Some(role) => routing::role_home(role),
            None => HOME_ROUTE,
        };
        self.navigator.navigate(target);
    }
}

/// Flattens payload validation failures into one message.
fn validate<T: Validate>(payload: &T) -> ClientResult<()> {
    if let Err(validation_errors) = payload.validate() {
        let error_messages: Vec<String> = validation_errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    format!(
                        "{}: {}",
                        field,
                        error.message.as_ref().unwrap_or(&"Invalid value".into())
                    )
                })
            })
            .collect();
        return Err(ClientError::validation(error_messages.join(", ")));
    }
    Ok(())
}
