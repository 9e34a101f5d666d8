use thiserror::Error;

pub const DEFAULT_FINGERPRINT: &str = "chrome";
pub const DEFAULT_URL_PATH: &str = "/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("link configuration is missing required option `{0}`")]
    Missing(&'static str),
}

/// Server and Reality parameters embedded in every link.
///
/// Fields stay optional so a half-filled environment can be represented and
/// rejected with the name of the first missing option.
#[derive(Debug, Clone, Default)]
pub struct LinkConfig {
    pub server_host: Option<String>,
    pub server_port: Option<String>,
    pub public_key: Option<String>,
    /// Comma-separated; the first non-empty entry is used.
    pub short_id: Option<String>,
    pub server_name: Option<String>,
    pub fingerprint: Option<String>,
    pub url_path: Option<String>,
}

/// Borrowed view of a config that passed validation.
pub(crate) struct Resolved<'a> {
    pub server_host: &'a str,
    pub server_port: &'a str,
    pub public_key: &'a str,
    pub short_id: &'a str,
    pub server_name: &'a str,
    pub fingerprint: &'a str,
    pub url_path: &'a str,
}

impl LinkConfig {
    /// Check that every required option is present and non-blank.
    pub fn validate(&self) -> Result<(), LinkError> {
        self.resolve().map(|_| ())
    }

    pub(crate) fn resolve(&self) -> Result<Resolved<'_>, LinkError> {
        let short_id = self
            .short_id
            .as_deref()
            .and_then(select_short_id)
            .ok_or(LinkError::Missing("short_id"))?;

        Ok(Resolved {
            server_host: required(&self.server_host, "server_host")?,
            server_port: required(&self.server_port, "server_port")?,
            public_key: required(&self.public_key, "public_key")?,
            short_id,
            server_name: required(&self.server_name, "server_name")?,
            fingerprint: optional(&self.fingerprint).unwrap_or(DEFAULT_FINGERPRINT),
            url_path: optional(&self.url_path).unwrap_or(DEFAULT_URL_PATH),
        })
    }
}

/// Pick the short id from a comma-separated list: first non-empty entry,
/// in list order.
pub fn select_short_id(raw: &str) -> Option<&str> {
    raw.split(',').map(str::trim).find(|s| !s.is_empty())
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, LinkError> {
    optional(value).ok_or(LinkError::Missing(name))
}

fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_takes_first_non_empty_entry() {
        assert_eq!(select_short_id("abc, def ,"), Some("abc"));
        assert_eq!(select_short_id(" , ,9f"), Some("9f"));
        assert_eq!(select_short_id(" , "), None);
        assert_eq!(select_short_id(""), None);
    }

    #[test]
    fn blank_required_option_is_reported_by_name() {
        let config = LinkConfig {
            server_host: Some("vpn.example.com".into()),
            server_port: Some("   ".into()),
            public_key: Some("pbk".into()),
            short_id: Some("ab".into()),
            server_name: Some("sni.example.com".into()),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(LinkError::Missing("server_port")));
    }

    #[test]
    fn short_id_list_without_entries_is_missing() {
        let config = LinkConfig {
            server_host: Some("vpn.example.com".into()),
            server_port: Some("443".into()),
            public_key: Some("pbk".into()),
            short_id: Some(",,".into()),
            server_name: Some("sni.example.com".into()),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(LinkError::Missing("short_id")));
    }
}
