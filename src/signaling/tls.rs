use crate::{
    config::Config,
    tls_utils::{build_pinned_root_store, load_relay_certs, load_relay_private_key},
};
use rustls::{ClientConfig, ServerConfig};
use std::{io, sync::Arc};

/// ClientConfig for the signaling client, trusting ONLY the CA at `ca_path`.
///
/// This is what gets passed to `SignalingClient::connect_tls`.
pub fn build_relay_client_config(ca_path: &str) -> io::Result<Arc<ClientConfig>> {
    let root_store = build_pinned_root_store(ca_path)?;

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(Arc::new(config))
}

/// ServerConfig for the relay, using *no* client auth and the configured cert.
///
/// Built once at startup; each accepted TCP connection is wrapped in its own
/// `ServerConnection` / `StreamOwned`.
pub fn build_relay_server_config(config: &Config) -> io::Result<Arc<ServerConfig>> {
    let certs = load_relay_certs(config)?;
    let key = load_relay_private_key(config)?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("TLS config error: {e}"))
        })?;

    Ok(Arc::new(config))
}
