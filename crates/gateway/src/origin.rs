use regex::Regex;
use tracing::warn;

use crate::config::GatewayConfig;

/// Decides whether an inbound message's origin may talk to the wallet.
///
/// The set is an explicit allow-list, never a deny-list: the reply
/// channel lets any accepted origin fully impersonate an authorized dapp,
/// so anything unrecognized is dropped. Rejection is silent toward the
/// caller — an unauthorized origin cannot distinguish "wrong origin" from
/// "no listener".
pub struct OriginValidator {
    patterns: Vec<Regex>,
    skip_origin_checks: bool,
}

impl OriginValidator {
    pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        if config.skip_origin_checks {
            warn!(
                "origin validation is DISABLED (skip_origin_checks) — every window reaching \
                 the channel is treated as an authorized dapp; never ship this setting"
            );
        }
        let patterns = config
            .origins
            .patterns()
            .map(Regex::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            skip_origin_checks: config.skip_origin_checks,
        })
    }

    pub fn is_authorized(&self, origin: &str) -> bool {
        if self.skip_origin_checks {
            return true;
        }
        self.patterns.iter().any(|pattern| pattern.is_match(origin))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn validator() -> OriginValidator {
        OriginValidator::from_config(&GatewayConfig::default()).unwrap()
    }

    #[test]
    fn production_origins_are_accepted() {
        let v = validator();
        assert!(v.is_authorized("https://exchange.aepps.com"));
        assert!(v.is_authorized("http://preview.aepps.dev"));
    }

    #[test]
    fn development_origins_are_accepted() {
        let v = validator();
        assert!(v.is_authorized("http://localhost"));
        assert!(v.is_authorized("http://localhost:8080"));
        assert!(v.is_authorized("https://localhost:3000"));
    }

    #[test]
    fn tunnel_origins_are_accepted() {
        assert!(validator().is_authorized("https://demo-wallet.ngrok.io"));
    }

    #[test]
    fn everything_else_is_rejected() {
        let v = validator();
        assert!(!v.is_authorized("https://evil.example"));
        assert!(!v.is_authorized("https://aepps.com.evil.example"));
        assert!(!v.is_authorized("https://localhost.evil.example"));
        assert!(!v.is_authorized(""));
    }

    #[test]
    fn bypass_accepts_anything_but_defaults_off() {
        assert!(!GatewayConfig::default().skip_origin_checks);

        let config = GatewayConfig {
            skip_origin_checks: true,
            ..GatewayConfig::default()
        };
        let v = OriginValidator::from_config(&config).unwrap();
        assert!(v.is_authorized("https://evil.example"));
    }
}
