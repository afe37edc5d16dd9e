pub mod config;
pub mod core;
pub mod error;
mod middlewares;
pub mod result;
pub mod routes;
pub mod start_warden_server;

#[cfg(test)]
mod tests;
