//! Role-based route gate.
//!
//! Pure decision logic: given the roles a route allows and the current
//! session, either let activation continue or name the route to go to
//! instead. Side effects (the actual navigation) belong to the shell.

use crate::auth::models::UserRole;
use crate::routing::{self, LOGIN_ROUTE};
use crate::session::SessionStore;

/// Outcome of a route authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Activation may continue.
    Proceed,
    /// Activation stops; the shell should move to the target instead.
    Redirect(&'static str),
}

/// Gate for role-restricted routes.
///
/// Signed-out sessions go to the login page. A signed-in user outside the
/// allow-list lands on their own role's home instead of an error page. An
/// empty allow-list admits any signed-in user.
pub fn authorize(allowed: &[UserRole], session: &SessionStore) -> RouteDecision {
    let Some(role) = session.role() else {
        return RouteDecision::Redirect(LOGIN_ROUTE);
    };

    if allowed.is_empty() || allowed.contains(&role) {
        RouteDecision::Proceed
    } else {
        RouteDecision::Redirect(routing::role_home(role))
    }
}
