use std::io;
use std::sync::Arc;

use crate::config::Config;
use crate::log::NoopLogSink;
use crate::log::log_sink::LogSink;
use crate::signaling::signaling_server::SignalingServer;
use crate::signaling::tls::build_relay_server_config;
use crate::sink_info;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Address the relay should bind, from `[Relay] listen_addr`.
pub fn listen_addr(config: &Config) -> &str {
    config.get_non_empty_or_default("Relay", "listen_addr", DEFAULT_LISTEN_ADDR)
}

/// Build the relay described by `config` without starting it.
///
/// TLS is enabled with `[Relay] use_tls = true`; certificate paths come from
/// the `[TLS]` section.
pub fn build_relay_server(config: &Config, log_sink: Arc<dyn LogSink>) -> io::Result<SignalingServer> {
    let addr = listen_addr(config);
    let server = SignalingServer::bind(addr, log_sink.clone())?;

    if config.get_bool_or("Relay", "use_tls", false) {
        let tls = build_relay_server_config(config)?;
        sink_info!(log_sink, "TLS enabled for relay on {}", addr);
        Ok(server.with_tls(tls))
    } else {
        Ok(server)
    }
}

/// Run the relay described by `config` using the given log sink. Blocks forever.
pub fn run_relay_server_with_log(config: &Config, log_sink: Arc<dyn LogSink>) -> io::Result<()> {
    build_relay_server(config, log_sink)?.run()
}

/// Convenience: run the relay with a `NoopLogSink` (no logging).
pub fn run_relay_server(config: &Config) -> io::Result<()> {
    run_relay_server_with_log(config, Arc::new(NoopLogSink))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn listen_addr_defaults_when_unset() {
        assert_eq!(listen_addr(&Config::empty()), DEFAULT_LISTEN_ADDR);
        let config = Config::parse("[Relay]\nlisten_addr = 127.0.0.1:9000\n");
        assert_eq!(listen_addr(&config), "127.0.0.1:9000");
    }

    #[test]
    fn plaintext_relay_binds_ephemeral_port() {
        let config = Config::parse("[Relay]\nlisten_addr = 127.0.0.1:0\n");
        let server = build_relay_server(&config, Arc::new(NoopLogSink)).unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn tls_without_certs_fails_to_build() {
        let config = Config::parse(
            "[Relay]\nlisten_addr = 127.0.0.1:0\nuse_tls = true\n[TLS]\nrelay_cert = /nonexistent/cert.pem\n",
        );
        assert!(build_relay_server(&config, Arc::new(NoopLogSink)).is_err());
    }
}
