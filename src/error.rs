pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The ways a remote call, or the launch of the dashboard, can fail.
///
/// Callers inside the engine absorb these: a failed fetch leaves the previous summary in place and
/// a failed submission reports `false`. The type is kept so that a front end can surface the
/// reason if it wants to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    /// Neither the navigation link nor the session store produced a complete session.
    #[error("no connection information is available, open the app using a link with 'api' and 'sheetId'")]
    MissingSession,

    /// The request could not be sent, timed out, returned a non-success status, or the body could
    /// not be decoded.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote side answered but the payload reports a logical error.
    #[error("the remote service reported an error: {0}")]
    Application(String),
}

impl From<reqwest::Error> for Failure {
    fn from(e: reqwest::Error) -> Self {
        Failure::Transport(e.to_string())
    }
}
