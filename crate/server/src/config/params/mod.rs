mod keys_params;
mod server_params;

pub use keys_params::KeysParams;
pub use server_params::ServerParams;
