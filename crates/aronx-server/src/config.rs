use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use aronx_link::LinkConfig;
use aronx_panel::PanelConfig;
use aronx_panel::config::DEFAULT_TIMEOUT_SECS;

/// Admin tokens that MUST NOT be used.
const PLACEHOLDER_TOKENS: &[&str] = &["change-me", "changeme", "admin"];

/// Everything the process needs, read once at startup.
#[derive(Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub admin_token: Option<String>,
    pub panel: PanelConfig,
    pub link: LinkConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port: u16 = var("ARONX_PORT")
            .unwrap_or_else(|| "8000".into())
            .parse()
            .context("ARONX_PORT is not a valid port")?;

        let admin_token = var("ADMIN_TOKEN");
        if let Some(token) = &admin_token {
            if PLACEHOLDER_TOKENS.contains(&token.as_str()) {
                bail!("ADMIN_TOKEN is still a placeholder; set a random secret or leave it empty");
            }
        }

        let Some(base_url) = var("XUI_BASE_URL") else {
            bail!("XUI_BASE_URL is not set");
        };
        let inbound_id: i64 = var("XUI_INBOUND_ID")
            .unwrap_or_else(|| "1".into())
            .parse()
            .context("XUI_INBOUND_ID is not an integer")?;

        let mut panel = PanelConfig::new(
            &base_url,
            &var("XUI_USERNAME").unwrap_or_default(),
            &var("XUI_PASSWORD").unwrap_or_default(),
            inbound_id,
        );
        panel.timeout_secs = match var("XUI_TIMEOUT_SECS") {
            Some(v) => v.parse().context("XUI_TIMEOUT_SECS is not an integer")?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let link = LinkConfig {
            server_host: var("VPN_SERVER_IP"),
            server_port: var("VPN_SERVER_PORT"),
            public_key: var("VPN_PUBLIC_KEY"),
            short_id: var("VPN_SHORT_ID"),
            server_name: var("VPN_SNI"),
            fingerprint: var("VPN_FINGERPRINT"),
            url_path: var("VPN_SPX"),
        };

        Ok(Self {
            host: var("ARONX_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: var("ARONX_DB_PATH").unwrap_or_else(|| "aronx.db".into()).into(),
            admin_token,
            panel,
            link,
        })
    }
}
