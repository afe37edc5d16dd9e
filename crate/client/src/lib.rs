pub use error::ClientError;
pub use reqwest;
pub use result::{ClientResult, ClientResultHelper};
pub use warden_rest_client::{WardenClient, attach_bearer, bearer_header};

mod error;
mod result;
pub mod types;
mod warden_rest_client;
