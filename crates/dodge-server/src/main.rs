use dodge_server::{DEFAULT_BIND_ADDR, DodgeError, DodgeServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), DodgeError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let bind = std::env::var("DODGE_BIND").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let mut builder = DodgeServer::builder().bind(&bind);

    match std::env::var("DODGE_SEED").map(|s| s.parse::<u32>()) {
        Ok(Ok(seed)) => builder = builder.seed(seed),
        Ok(Err(e)) => tracing::warn!(error = %e, "ignoring invalid DODGE_SEED"),
        Err(_) => {}
    }

    builder.build().await?.run().await
}
