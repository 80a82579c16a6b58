// src/config.rs

use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    // Server config
    #[serde(default = "default_port")]
    pub port: u16,
    pub environment: Option<String>,

    // Pipeline config
    #[serde(default = "default_stage_timeout_ms")]
    pub stage_timeout_ms: u64,
    #[serde(default = "default_auto_approve_limit")]
    pub auto_approve_limit: f64,
    #[serde(default = "default_match_tolerance_pct")]
    pub match_tolerance_pct: f64,
    #[serde(default = "default_high_risk_amount")]
    pub high_risk_amount: f64,
    #[serde(default)]
    pub require_vendor_tax_id: bool,

    // Frontend URL (CORS)
    #[serde(default = "default_frontend_base_url")]
    pub frontend_base_url: String,
}

fn default_port() -> u16 {
    8080
}

fn default_stage_timeout_ms() -> u64 {
    // Per-stage budget; agents calling slow external services must fit in this.
    30_000
}

fn default_auto_approve_limit() -> f64 {
    5_000.0
}

fn default_match_tolerance_pct() -> f64 {
    0.5
}

fn default_high_risk_amount() -> f64 {
    50_000.0
}

fn default_frontend_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Config {
    /// Load config from environment variables using envy.
    pub fn load() -> Result<Self, anyhow::Error> {
        envy::from_env::<Self>().map_err(anyhow::Error::from)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            environment: None,
            stage_timeout_ms: default_stage_timeout_ms(),
            auto_approve_limit: default_auto_approve_limit(),
            match_tolerance_pct: default_match_tolerance_pct(),
            high_risk_amount: default_high_risk_amount(),
            require_vendor_tax_id: false,
            frontend_base_url: default_frontend_base_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert!(config.stage_timeout_ms > 0);
        assert!(config.match_tolerance_pct > 0.0);
    }
}
