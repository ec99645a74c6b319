//! `DodgeServer` builder and server loop.
//!
//! This is the entry point for running a dodge server. It ties together
//! all the layers: transport → protocol → session → world, and owns the
//! two background tasks (simulation and broadcaster).

use std::net::SocketAddr;
use std::sync::Arc;

use dodge_protocol::JsonCodec;
use dodge_sim::{GameConfig, World};
use dodge_transport::{TcpTransport, Transport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::tasks::{run_broadcaster, run_simulation};
use crate::DodgeError;

/// Address used when the builder is not given one.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5055";

/// Shared server state passed to each task.
///
/// The world is the only shared mutable resource and sits behind a single
/// lock. Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState {
    pub(crate) world: Mutex<World>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a dodge server.
///
/// # Example
///
/// ```rust,no_run
/// use dodge_server::DodgeServer;
///
/// # async fn start() -> Result<(), dodge_server::DodgeError> {
/// let server = DodgeServer::builder()
///     .bind("127.0.0.1:5055")
///     .seed(42)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct DodgeServerBuilder {
    bind_addr: String,
    game: GameConfig,
    seed: Option<u32>,
}

impl DodgeServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            game: GameConfig::default(),
            seed: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the gameplay constants.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game = config;
        self
    }

    /// Fixes the process seed instead of drawing a random one.
    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Binds the listener and creates the world.
    ///
    /// # Errors
    /// Returns [`DodgeError::Transport`] if the address cannot be bound.
    /// This is the only fatal error of the server.
    pub async fn build(self) -> Result<DodgeServer, DodgeError> {
        let transport = TcpTransport::bind(&self.bind_addr).await?;
        let seed = self.seed.unwrap_or_else(rand::random);
        tracing::info!(seed, "world seeded");

        let state = Arc::new(ServerState {
            world: Mutex::new(World::new(self.game, seed)),
            codec: JsonCodec,
        });

        Ok(DodgeServer { transport, state })
    }
}

impl Default for DodgeServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound dodge server.
///
/// Call [`run()`](Self::run) to start the simulation and accept
/// connections.
pub struct DodgeServer {
    transport: TcpTransport,
    state: Arc<ServerState>,
}

impl DodgeServer {
    /// Creates a new builder.
    pub fn builder() -> DodgeServerBuilder {
        DodgeServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server.
    ///
    /// Spawns the simulation and broadcaster tasks, then accepts incoming
    /// connections and spawns a handler task for each. Accept errors are
    /// logged and the loop continues. Runs until the process is
    /// terminated.
    pub async fn run(mut self) -> Result<(), DodgeError> {
        let (tick_hz, snapshot_hz, seed) = {
            let world = self.state.world.lock().await;
            (world.config().tick_hz, world.config().snapshot_hz, world.seed())
        };
        tracing::info!(tick_hz, snapshot_hz, seed, "dodge server running");

        tokio::spawn(run_simulation(Arc::clone(&self.state), tick_hz));
        tokio::spawn(run_broadcaster(Arc::clone(&self.state), snapshot_hz));

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
