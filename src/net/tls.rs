//! TLS configuration and certificate loading.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;
use rcgen::{generate_simple_self_signed, CertifiedKey};

/// Error type for TLS setup.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("failed to load certificate: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to generate self-signed certificate: {0}")]
    Generate(#[from] rcgen::Error),

    #[error("tls_cert and tls_key must be set together")]
    IncompletePair,
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    if !cert_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Certificate file not found: {:?}", cert_path),
        )
        .into());
    }
    if !key_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Private key file not found: {:?}", key_path),
        )
        .into());
    }

    install_crypto_provider();
    Ok(RustlsConfig::from_pem_file(cert_path, key_path).await?)
}

/// Generate a throwaway certificate for `localhost` and `127.0.0.1`.
pub async fn self_signed_config() -> Result<RustlsConfig, TlsError> {
    let subject_alt_names = vec!["localhost".to_string(), "127.0.0.1".to_string()];
    let CertifiedKey { cert, key_pair } = generate_simple_self_signed(subject_alt_names)?;

    install_crypto_provider();
    tracing::info!("Using a self-signed certificate for localhost");
    Ok(RustlsConfig::from_der(vec![cert.der().to_vec()], key_pair.serialize_der()).await?)
}

/// Configured certificate files when both are set, self-signed when neither is.
pub async fn tls_config(cert: Option<&str>, key: Option<&str>) -> Result<RustlsConfig, TlsError> {
    match (cert, key) {
        (Some(cert), Some(key)) => load_tls_config(Path::new(cert), Path::new(key)).await,
        (None, None) => self_signed_config().await,
        _ => Err(TlsError::IncompletePair),
    }
}

/// More than one rustls backend may be compiled in; pin ring for the process.
fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}
