use chrono::{DateTime, TimeDelta, Utc};

/// Authenticated context returned by the login endpoint.
///
/// The token is an owned value handed back into every call, so separate
/// accounts never share authentication state. A token rejected by the cloud
/// must not be reused: drop the session and authenticate again.
#[derive(Clone)]
pub struct Session {
    token: String,
    issued_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self { token, issued_at: Utc::now() }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The cloud does not report the token lifetime.
    /// Two hours is what the vendor's own web application assumes.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() - self.issued_at >= TimeDelta::hours(2)
    }
}
