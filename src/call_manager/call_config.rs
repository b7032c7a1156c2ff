use std::time::Duration;

use crate::call_manager::peer_connection::RtcConfiguration;
use crate::config::Config;

pub const DEFAULT_OFFER_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ICE_SERVER: &str = "stun:stun.l.google.com:19302";

/// Client-side call settings, read from the `[Client]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallConfig {
    /// How long an unanswered offer stays outstanding.
    pub offer_timeout: Duration,
    /// Never empty.
    pub ice_servers: Vec<String>,
}

impl CallConfig {
    pub fn from_config(config: &Config) -> Self {
        let mut ice_servers = config.get_list("Client", "ice_servers");
        if ice_servers.is_empty() {
            ice_servers.push(DEFAULT_ICE_SERVER.to_owned());
        }
        Self {
            offer_timeout: Duration::from_secs(config.get_u64_or(
                "Client",
                "offer_timeout_secs",
                DEFAULT_OFFER_TIMEOUT_SECS,
            )),
            ice_servers,
        }
    }

    pub fn with_offer_timeout(mut self, timeout: Duration) -> Self {
        self.offer_timeout = timeout;
        self
    }

    pub fn rtc_configuration(&self) -> RtcConfiguration {
        RtcConfiguration {
            ice_servers: self.ice_servers.clone(),
        }
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        Self::from_config(&Config::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_include_a_stun_server() {
        let cfg = CallConfig::default();
        assert_eq!(cfg.offer_timeout, Duration::from_secs(30));
        assert_eq!(cfg.ice_servers, vec![DEFAULT_ICE_SERVER.to_string()]);
    }

    #[test]
    fn client_section_overrides_defaults() {
        let config = Config::parse(
            "[Client]\noffer_timeout_secs = 5\nice_servers = stun:a.example:3478, turn:b.example:3478\n",
        );
        let cfg = CallConfig::from_config(&config);
        assert_eq!(cfg.offer_timeout, Duration::from_secs(5));
        assert_eq!(
            cfg.rtc_configuration().ice_servers,
            vec!["stun:a.example:3478", "turn:b.example:3478"]
        );
    }

    #[test]
    fn blank_ice_list_falls_back_to_default() {
        let cfg = CallConfig::from_config(&Config::parse("[Client]\nice_servers = , \n"));
        assert_eq!(cfg.ice_servers.len(), 1);
    }
}
