use crate::error::CredentialError;

pub type CResult<R> = Result<R, CredentialError>;

/// Attach a human readable context to foreign errors.
pub trait CResultHelper<T> {
    /// Sets the context for the error.
    ///
    /// # Errors
    ///
    /// Returns a `CResult` with the specified context if the original result is an error.
    fn context(self, context: &str) -> CResult<T>;
}

impl<T, E> CResultHelper<T> for Result<T, E>
where
    E: std::error::Error,
{
    fn context(self, context: &str) -> CResult<T> {
        self.map_err(|e| CredentialError::ServerError(format!("{context}: {e}")))
    }
}
