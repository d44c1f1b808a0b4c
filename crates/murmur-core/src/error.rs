use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between a user action and the hosted
/// backend. Validation variants are raised before any network call.
#[derive(Debug, Error)]
pub enum Error {
    #[error("task title must not be empty")]
    EmptyTitle,

    #[error("tag name must not be empty")]
    EmptyTagName,

    #[error("{0} is not a palette color")]
    UnknownColor(String),

    #[error("not signed in")]
    NotSignedIn,

    #[error("{collection} record not found: {id}")]
    NotFound { collection: &'static str, id: String },

    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("no speech detected")]
    NoSpeech,

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors the user fixes by changing their input, as opposed
    /// to round-trip failures.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::EmptyTitle | Error::EmptyTagName | Error::UnknownColor(_)
        )
    }
}
