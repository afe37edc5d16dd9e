use crate::error::WardenError;

pub type KResult<R> = Result<R, WardenError>;
