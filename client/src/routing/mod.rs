//! Route surface of the application shell.
//!
//! Holds the canonical route constants, the per-role landing pages, the
//! static table mapping top-level path segments to access rules, and the
//! navigation channel the rest of the client uses to ask the shell to move
//! somewhere.

use crate::auth::guard::{RouteDecision, authorize};
use crate::auth::models::UserRole;
use crate::session::SessionStore;
use tokio::sync::mpsc;

pub const HOME_ROUTE: &str = "/";
pub const LOGIN_ROUTE: &str = "/login";
pub const TRUCKER_HOME: &str = "/motorista/dashboard";
pub const CARRIER_HOME: &str = "/transportadora/dashboard";
pub const ADMIN_HOME: &str = "/admin/caminhoneiros";

/// Landing page for a signed-in role.
pub fn role_home(role: UserRole) -> &'static str {
    match role {
        UserRole::Trucker => TRUCKER_HOME,
        UserRole::Carrier => CARRIER_HOME,
        UserRole::Admin | UserRole::Operator => ADMIN_HOME,
    }
}

/// Access rule for a top-level route segment.
#[derive(Debug, Clone, Copy)]
pub enum RouteAccess {
    /// Open to everyone.
    Public,
    /// Any signed-in role.
    Authenticated,
    /// Signed-in and holding one of the listed roles.
    Roles(&'static [UserRole]),
}

/// First path segment to access rule. Unknown segments redirect home.
pub const ROUTE_TABLE: &[(&str, RouteAccess)] = &[
    ("", RouteAccess::Public),
    ("cargas-disponiveis", RouteAccess::Public),
    ("cadastrar-caminhao", RouteAccess::Public),
    ("contato", RouteAccess::Public),
    ("login", RouteAccess::Public),
    ("cadastro-caminhoneiro", RouteAccess::Public),
    ("cadastro-transportadora", RouteAccess::Public),
    ("esqueci-senha", RouteAccess::Public),
    ("nova-senha", RouteAccess::Public),
    ("suporte", RouteAccess::Authenticated),
    ("motorista", RouteAccess::Roles(&[UserRole::Trucker])),
    ("transportadora", RouteAccess::Roles(&[UserRole::Carrier])),
    (
        "admin",
        RouteAccess::Roles(&[UserRole::Admin, UserRole::Operator]),
    ),
];

/// Decides whether the session may enter `path`.
pub fn resolve(path: &str, session: &SessionStore) -> RouteDecision {
    let segment = path
        .trim_start_matches('/')
        .split(|c| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or("");

    let Some((_, access)) = ROUTE_TABLE.iter().find(|(name, _)| *name == segment) else {
        return RouteDecision::Redirect(HOME_ROUTE);
    };

    match access {
        RouteAccess::Public => RouteDecision::Proceed,
        RouteAccess::Authenticated => authorize(&[], session),
        RouteAccess::Roles(allowed) => authorize(allowed, session),
    }
}

/// Handle the client uses to request navigation from the shell.
#[derive(Clone)]
pub struct Navigator {
    tx: mpsc::UnboundedSender<String>,
}

impl Navigator {
    /// Creates the handle and the receiver the shell drains.
    pub fn channel() -> (Navigator, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Navigator { tx }, rx)
    }

    /// Asks the shell to move to `target`. A shell that already went away
    /// ignores the request.
    pub fn navigate(&self, target: impl Into<String>) {
        let _ = self.tx.send(target.into());
    }
}
