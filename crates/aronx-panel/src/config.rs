use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Panel root, e.g. `https://panel.example.com:2053/secret-path`.
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub inbound_id: i64,
    pub timeout_secs: u64,
}

impl PanelConfig {
    pub fn new(base_url: &str, username: &str, password: &str, inbound_id: i64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            inbound_id,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Scheme, host and port only. The base path is often a secret and
    /// must stay out of logs.
    pub fn origin(&self) -> String {
        match reqwest::Url::parse(&self.base_url) {
            Ok(url) => {
                let host = url.host_str().unwrap_or_default();
                match url.port() {
                    Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
                    None => format!("{}://{}", url.scheme(), host),
                }
            }
            Err(_) => "<invalid panel url>".to_string(),
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
