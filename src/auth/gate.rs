use crate::backend::BackendMode;
use crate::models::Role;
use crate::session::SessionState;

/// Outcome of checking a session against a page's role requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The session has not finished loading; nothing can be decided yet.
    Loading,
    Authorized,
    /// Send the browser to this login URL. No page content is rendered.
    Redirect(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGate {
    required: Role,
}

pub const ADMIN_ONLY: PageGate = PageGate::new(Role::Admin);
pub const CUSTOMER_ONLY: PageGate = PageGate::new(Role::Customer);

impl PageGate {
    pub const fn new(required: Role) -> Self {
        Self { required }
    }

    pub fn required_role(&self) -> Role {
        self.required
    }

    /// Decide access for `state`.
    ///
    /// Without a hosted backend anonymous visitors are let through, but a
    /// signed-in user is always held to the page's role.
    pub fn evaluate(&self, mode: BackendMode, state: &SessionState) -> GateDecision {
        if state.loading {
            return GateDecision::Loading;
        }

        match &state.user {
            Some(user) if user.role == self.required => GateDecision::Authorized,
            None if mode.is_demo() => GateDecision::Authorized,
            _ => GateDecision::Redirect(login_url(self.required)),
        }
    }
}

/// Login page with `role` preselected.
pub fn login_url(role: Role) -> String {
    let query = serde_urlencoded::to_string([("role", role.as_str())])
        .unwrap_or_else(|_| format!("role={}", role));
    format!("/auth/login?{}", query)
}
