use catalog_store::RemoteError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} must be a whole number, got '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid kickoff time '{0}'")]
    InvalidKickoff(String),

    #[error("{0}")]
    InvalidChoice(String),
}

#[derive(Debug, Error)]
pub enum AdminError {
    /// Deliberately generic: never says which half of the pair was wrong.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Admin login required")]
    NotLoggedIn,

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("{}", .0.message())]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
