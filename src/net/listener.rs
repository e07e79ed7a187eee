//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve and bind the configured host and port
//! - Report bind failures with the address that was attempted

use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

impl ListenerError {
    /// Underlying I/O error kind, e.g. `AddrInUse`.
    pub fn kind(&self) -> std::io::ErrorKind {
        match self {
            ListenerError::Bind { source, .. } => source.kind(),
        }
    }
}

/// Bind `host:port`. Port `0` picks an ephemeral port.
pub async fn bind(host: &str, port: u16) -> Result<(TcpListener, SocketAddr), ListenerError> {
    let address = format!("{}:{}", host, port);
    let to_error = |source| ListenerError::Bind {
        address: address.clone(),
        source,
    };

    let listener = TcpListener::bind((host, port)).await.map_err(to_error)?;
    let local_addr = listener.local_addr().map_err(to_error)?;

    tracing::info!(address = %local_addr, "Listener bound");
    Ok((listener, local_addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_ephemeral() {
        let (_listener, addr) = bind("127.0.0.1", 0).await.unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_conflict() {
        let (_listener, addr) = bind("127.0.0.1", 0).await.unwrap();
        let err = bind("127.0.0.1", addr.port()).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AddrInUse);
    }
}
