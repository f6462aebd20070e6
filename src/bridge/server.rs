// * Bridge HTTP server - hyper accept loop with graceful shutdown

use crate::bridge::routes::{route, BridgeState};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: hyper::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] hyper::Error),
}

/// Binds the listener and returns the bound address plus the server future.
///
/// The future resolves once `shutdown` completes and in-flight requests drain.
pub fn bind(
    addr: SocketAddr,
    state: Arc<BridgeState>,
    shutdown: impl Future<Output = ()>,
) -> Result<(SocketAddr, impl Future<Output = Result<(), BridgeError>>), BridgeError> {
    let make_svc = hyper::service::make_service_fn(move |_conn| {
        let state = Arc::clone(&state);
        async move {
            Ok::<_, Infallible>(hyper::service::service_fn(move |req| {
                let state = Arc::clone(&state);
                async move { Ok::<_, Infallible>(route(req, state).await) }
            }))
        }
    });

    let server = hyper::Server::try_bind(&addr)
        .map_err(|source| BridgeError::Bind { addr, source })?
        .serve(make_svc);
    let local_addr = server.local_addr();

    let running = async move {
        server.with_graceful_shutdown(shutdown).await?;
        info!("Bridge stopped");
        Ok(())
    };
    Ok((local_addr, running))
}

/// Serves until `shutdown` completes.
pub async fn serve(
    addr: SocketAddr,
    state: Arc<BridgeState>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), BridgeError> {
    let (local_addr, running) = bind(addr, state, shutdown)?;
    info!(addr = %local_addr, "Lab bridge listening");
    running.await
}
