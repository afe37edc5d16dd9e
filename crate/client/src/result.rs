use crate::error::ClientError;

pub type ClientResult<R> = Result<R, ClientError>;

pub trait ClientResultHelper<T> {
    fn context(self, context: &str) -> ClientResult<T>;
}

impl<T, E> ClientResultHelper<T> for Result<T, E>
where
    E: std::error::Error,
{
    fn context(self, context: &str) -> ClientResult<T> {
        self.map_err(|e| ClientError::Default(format!("{context}: {e}")))
    }
}
