use std::sync::{Arc, mpsc};

use actix_web::{
    App, HttpServer,
    dev::{Server, ServerHandle},
    web::{Data, JsonConfig},
};
use tracing::info;

use crate::{
    config::ServerParams, core::Warden, error::WardenError, result::KResult, routes,
};

// token requests are small
const MAX_JSON_PAYLOAD: usize = 64 * 1024;

/// Start the Warden server and run it until it is stopped.
///
/// # Arguments
///
/// * `server_params` - the settings of the server
/// * `server_handle_transmitter` - receives the handle of the running server, to stop it
///
/// # Errors
///
/// Fails when the address cannot be bound or the handle cannot be sent.
pub async fn start_warden_server(
    server_params: Arc<ServerParams>,
    server_handle_transmitter: Option<mpsc::Sender<ServerHandle>>,
) -> KResult<()> {
    info!("Starting the Warden server on {}", server_params.server_url());
    let warden = Arc::new(Warden::instantiate(server_params));
    let server = prepare_warden_server(warden)?;

    if let Some(transmitter) = server_handle_transmitter {
        transmitter.send(server.handle()).map_err(|e| {
            WardenError::ServerError(format!("failed to send the server handle: {e}"))
        })?;
    }

    server.await.map_err(Into::into)
}

/// Build the HTTP server listening on the configured address. It is not
/// started until awaited.
///
/// # Errors
///
/// Fails when the address cannot be bound.
pub fn prepare_warden_server(warden: Arc<Warden>) -> KResult<Server> {
    let address = format!("{}:{}", warden.params.hostname, warden.params.port);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(Data::new(warden.clone()))
            .app_data(JsonConfig::default().limit(MAX_JSON_PAYLOAD))
            .configure(routes::configure)
    });
    Ok(server.bind(address)?.run())
}
