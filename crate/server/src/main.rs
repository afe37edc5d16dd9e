use std::sync::Arc;

use dotenvy::dotenv;
use tracing::{debug, info};
use warden_logger::log_init;
use warden_server::{
    config::{ClapConfig, ServerParams},
    result::KResult,
    start_warden_server::start_warden_server,
};

/// The main entrypoint of the program.
///
/// The configuration comes from the file named by `WARDEN_CONF` when it
/// exists, otherwise from the command line and the environment.
#[tokio::main]
async fn main() -> KResult<()> {
    // Load variable from a .env file
    dotenv().ok();

    let clap_config = ClapConfig::load_from_file()?;

    let info_only = clap_config.info;
    let rust_log = if info_only {
        Some("info")
    } else {
        clap_config.logging.rust_log.as_deref()
    };
    log_init(rust_log, clap_config.logging.quiet);

    info!(
        "OpenSSL version: {}, in {}, number: {:x}",
        openssl::version::version(),
        openssl::version::dir(),
        openssl::version::number()
    );

    debug!("Command line config: {clap_config:#?}");

    let server_params = ServerParams::try_from(clap_config)?;
    info!("Server params: {server_params:#?}");

    if info_only {
        info!("Server started with --info. Exiting");
        return Ok(());
    }

    Box::pin(start_warden_server(Arc::new(server_params), None)).await
}
