//! `MessServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session → rules.

use std::marker::PhantomData;
use std::net::SocketAddr;
use std::sync::Arc;

use mess_protocol::{Codec, JsonCodec};
use mess_rules::RulesEngine;
use mess_session::Dispatcher;
use mess_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::MessError;

/// Runtime settings for a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// State shared by every connection task.
///
/// The one `Mutex` around the dispatcher is the only lock in the server: it
/// orders pairing, moves and disconnects across all connections, so no two
/// moves for a session are ever evaluated at once.
pub(crate) struct ServerState<R: RulesEngine, C: Codec> {
    pub(crate) dispatcher: Mutex<Dispatcher<R, C>>,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a Mess server.
///
/// # Example
///
/// ```rust,no_run
/// use mess::prelude::*;
///
/// # async fn start() -> Result<(), MessError> {
/// let server = MessServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build::<StandardChess>()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MessServerBuilder {
    config: ServerConfig,
}

impl MessServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener and prepares the server, speaking JSON.
    pub async fn build<R: RulesEngine>(
        self,
    ) -> Result<MessServer<R, JsonCodec>, MessError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            dispatcher: Mutex::new(Dispatcher::new(JsonCodec)),
            codec: JsonCodec,
            config: self.config,
        });

        Ok(MessServer {
            transport,
            state,
            _rules: PhantomData,
        })
    }
}

/// A bound Mess server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct MessServer<R: RulesEngine, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<R, C>>,
    _rules: PhantomData<fn() -> R>,
}

impl<R, C> MessServer<R, C>
where
    R: RulesEngine,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Every accepted connection gets its own task. A failed accept or
    /// upgrade is logged and the loop carries on.
    pub async fn run(mut self) -> Result<(), MessError> {
        tracing::info!(
            addr = ?self.local_addr().ok(),
            bind = %self.state.config.bind_addr,
            "mess server running"
        );

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
