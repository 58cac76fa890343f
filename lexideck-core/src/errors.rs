use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("invalid input: {0}")]
    Invalid(&'static str),
    #[error("storage error: {0}")]
    Storage(&'static str),
}

/// The content source could not deliver a page (transport, auth, quota).
#[derive(Debug, Error)]
#[error("fetch failed: {0}")]
pub struct FetchError(pub String);

impl FetchError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl From<CoreError> for FetchError {
    fn from(e: CoreError) -> Self {
        Self(e.to_string())
    }
}

/// A review record was not stored.
#[derive(Debug, Error)]
#[error("persist failed: {0}")]
pub struct PersistError(pub String);

impl PersistError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl From<CoreError> for PersistError {
    fn from(e: CoreError) -> Self {
        Self(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("speech synthesis disabled")]
    Disabled,
    #[error("speech request failed: {0}")]
    Request(String),
    #[error("audio io: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_errors_carry_into_collaborator_errors() {
        let fetch: FetchError = CoreError::Invalid("cursor").into();
        assert_eq!(fetch.to_string(), "fetch failed: invalid input: cursor");

        let persist: PersistError = CoreError::NotFound("card").into();
        assert_eq!(persist.to_string(), "persist failed: not found: card");

        let persist: PersistError = CoreError::Storage("io").into();
        assert_eq!(persist.to_string(), "persist failed: storage error: io");
    }
}
