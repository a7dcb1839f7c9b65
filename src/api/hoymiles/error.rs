/// Failure taxonomy of the Hoymiles Cloud client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The cloud would not hand out a token for the supplied credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A previously valid session token was rejected mid-session.
    /// The caller is expected to re-authenticate and retry on its next tick.
    #[error("session token rejected by the cloud")]
    AuthExpired,

    #[error("request failed")]
    Http(#[from] reqwest::Error),

    /// Non-zero vendor status, reported in the body with HTTP 200.
    #[error(r#"Hoymiles Cloud error {status} ("{message}")"#)]
    Cloud { status: String, message: String },

    #[error("malformed response")]
    MalformedResponse(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether the failure is worth one immediate retry.
    ///
    /// Only transport-level hiccups qualify; a vendor rejection would just
    /// be rejected again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(error) => error.is_timeout() || error.is_connect() || error.is_request(),
            _ => false,
        }
    }
}
