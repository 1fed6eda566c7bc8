use crate::{persist::StoredSession, user::User};

/// Process-wide session state handed by reference to whatever needs it.
///
/// The cart rows live in the cart runtime; this holds what the
/// authentication flow owns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    is_authenticated: bool,
    profile: Option<User>,
}

impl AppState {
    /// Signed-out state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds state from persisted session data: a stored access token means
    /// the user is treated as signed in.
    pub fn from_session(session: &StoredSession) -> Self {
        Self {
            is_authenticated: session.access_token.is_some(),
            profile: session.profile.clone(),
        }
    }

    /// Marks the session authenticated as `profile`.
    pub fn sign_in(&mut self, profile: User) {
        self.is_authenticated = true;
        self.profile = Some(profile);
    }

    /// Replaces the cached profile.
    pub fn set_profile(&mut self, profile: User) {
        self.profile = Some(profile);
    }

    /// Whether a session is active.
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    /// Cached profile of the signed-in user.
    pub fn profile(&self) -> Option<&User> {
        self.profile.as_ref()
    }

    /// Drops authentication and profile.
    pub fn reset(&mut self) {
        self.is_authenticated = false;
        self.profile = None;
    }
}
