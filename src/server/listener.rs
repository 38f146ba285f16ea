use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{Instrument, info, info_span, warn};

use crate::server::app::App;

/// Accepts plain TCP connections forever, one task per connection. A failed
/// accept is logged and skipped.
pub async fn run(listener: TcpListener, app: Arc<App>) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        info!("Accepted connection from {}", peer);

        let app = Arc::clone(&app);
        tokio::spawn(
            async move {
                if let Err(e) = app.serve_connection(socket).await {
                    tracing::error!("Connection error from {}: {}", peer, e);
                }
            }
            .instrument(info_span!("conn", %peer)),
        );
    }
}

/// Accepts TCP connections and completes a TLS handshake on each before
/// serving it. A failed handshake drops only that connection.
pub async fn run_tls(listener: TcpListener, acceptor: TlsAcceptor, app: Arc<App>) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        info!("Accepted connection from {}", peer);

        let app = Arc::clone(&app);
        let acceptor = acceptor.clone();
        tokio::spawn(
            async move {
                let stream = match acceptor.accept(socket).await {
                    Ok(stream) => stream,
                    Err(e) => {
                        warn!(error = %e, "TLS handshake failed");
                        return;
                    }
                };
                if let Err(e) = app.serve_connection(stream).await {
                    tracing::error!("Connection error from {}: {}", peer, e);
                }
            }
            .instrument(info_span!("conn", %peer)),
        );
    }
}
