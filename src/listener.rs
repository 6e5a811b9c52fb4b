//! TCP accept loop
//!
//! One handler task per accepted connection, with no cap on how many run at
//! once.

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::handler::{handle_connection, HandlerSettings};
use crate::server::ServerHandle;

/// Accept connections forever
///
/// Accept errors are logged and the loop keeps going; a failing handler
/// only ends its own connection.
pub async fn serve(listener: TcpListener, server: ServerHandle, settings: HandlerSettings) {
    if let Ok(addr) = listener.local_addr() {
        info!("Chat relay listening on {}", addr);
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let server = server.clone();
                let settings = settings.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, server, settings).await {
                        error!("Connection handler error ({}): {}", addr, e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
