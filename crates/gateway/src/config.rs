use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

/// Environment variable that disables origin validation. Local testing
/// only; defaults off.
pub const SKIP_ORIGIN_CHECKS_ENV: &str = "PALISADE_SKIP_ORIGIN_CHECKS";

// ── Origin allow-list ────────────────────────────────────────────────────────

/// Origin allow-list patterns, compiled by the validator. Anything not
/// matching one of these is dropped without a reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Production dapp hosts.
    pub production: Vec<String>,
    /// Local development hosts.
    pub development: Vec<String>,
    /// Tunnel hosts used to demo a dapp against a live wallet.
    pub tunnels: Vec<String>,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            production: vec![r"^https?://.*\.aepps\.(?:com|dev)$".into()],
            development: vec![r"^https?://localhost(?::\d+)?$".into()],
            tunnels: vec![r"^https?://.*\.ngrok\.io$".into()],
        }
    }
}

impl OriginConfig {
    /// All patterns, production first.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.production
            .iter()
            .chain(&self.development)
            .chain(&self.tunnels)
            .map(String::as_str)
    }
}

// ── Gateway configuration ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub origins: OriginConfig,
    /// Disables origin validation entirely, so any window that reaches
    /// the channel can impersonate an authorized dapp. Off unless
    /// [`SKIP_ORIGIN_CHECKS_ENV`] or the config file turns it on.
    pub skip_origin_checks: bool,
}

impl GatewayConfig {
    /// Load from a TOML file, falling back to defaults when the file is
    /// absent. Environment overrides apply either way.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config: Self = if path.exists() {
            toml::from_str(&fs::read_to_string(path)?)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(raw) = std::env::var(SKIP_ORIGIN_CHECKS_ENV) {
            self.skip_origin_checks = parse_flag(&raw);
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
