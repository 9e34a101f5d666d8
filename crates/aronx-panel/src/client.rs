use std::sync::Arc;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::candidates::{DELETE_CANDIDATES, DeleteCandidate};
use crate::config::PanelConfig;
use crate::error::{CREATE_BODY_LIMIT, PROBE_BODY_LIMIT, PanelError, truncate};
use crate::{PanelSession, RemotePanel};

const CLIENT_FLOW: &str = "xtls-rprx-vision";

/// The `{success, msg}` envelope the panel wraps most replies in.
#[derive(Debug, Deserialize)]
struct Envelope {
    success: Option<bool>,
    #[serde(default)]
    msg: Option<String>,
}

#[derive(Serialize)]
struct ClientEntry<'a> {
    id: &'a str,
    flow: &'a str,
    email: &'a str,
    enable: bool,
}

#[derive(Serialize)]
struct ClientSettings<'a> {
    clients: [ClientEntry<'a>; 1],
}

/// The panel expects `settings` as a JSON document serialized into a string.
#[derive(Serialize)]
struct AddClientRequest {
    id: i64,
    settings: String,
}

/// Panel reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPanel {
    config: Arc<PanelConfig>,
}

impl HttpPanel {
    pub fn new(config: PanelConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl RemotePanel for HttpPanel {
    type Session = HttpSession;

    async fn authenticate(&self) -> Result<HttpSession, PanelError> {
        // Fresh cookie jar per session.
        let http = Client::builder()
            .cookie_store(true)
            .timeout(self.config.timeout())
            .build()
            .map_err(PanelError::Client)?;

        let response = http
            .post(self.config.url("/login"))
            .form(&[
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PanelError::Auth {
                reason: e.to_string(),
            })?;

        let (status, text) = read_body(response).await;
        if !status.is_success() {
            return Err(PanelError::Auth {
                reason: format!("HTTP {}: {}", status.as_u16(), truncate(&text, PROBE_BODY_LIMIT)),
            });
        }

        let envelope: Envelope = serde_json::from_str(&text).map_err(|_| PanelError::Auth {
            reason: format!("unexpected login response: {}", truncate(&text, PROBE_BODY_LIMIT)),
        })?;

        if envelope.success != Some(true) {
            return Err(PanelError::Auth {
                reason: envelope.msg.unwrap_or_else(|| "credentials rejected".to_string()),
            });
        }

        debug!("Logged in to panel at {}", self.config.origin());
        Ok(HttpSession {
            http,
            config: self.config.clone(),
        })
    }
}

/// Logged-in panel session. Dropped at the end of the operation.
pub struct HttpSession {
    http: Client,
    config: Arc<PanelConfig>,
}

impl PanelSession for HttpSession {
    async fn create_client(&self, credential_id: &str) -> Result<(), PanelError> {
        let settings = serde_json::to_string(&ClientSettings {
            clients: [ClientEntry {
                id: credential_id,
                flow: CLIENT_FLOW,
                email: credential_id,
                enable: true,
            }],
        })
        .map_err(|e| PanelError::Create {
            status: None,
            body: e.to_string(),
        })?;

        let payload = AddClientRequest {
            id: self.config.inbound_id,
            settings,
        };

        let response = self
            .http
            .post(self.config.url("/panel/api/inbounds/addClient"))
            .json(&payload)
            .send()
            .await
            .map_err(|e| PanelError::Create {
                status: None,
                body: e.to_string(),
            })?;

        let (status, text) = read_body(response).await;
        if !status.is_success() {
            return Err(PanelError::Create {
                status: Some(status.as_u16()),
                body: truncate(&text, CREATE_BODY_LIMIT),
            });
        }

        // A 2xx whose body is not JSON counts as success; only an explicit
        // `success: false` is a failure.
        if let Ok(envelope) = serde_json::from_str::<Envelope>(&text) {
            if envelope.success == Some(false) {
                return Err(PanelError::Create {
                    status: Some(status.as_u16()),
                    body: truncate(&text, CREATE_BODY_LIMIT),
                });
            }
        } else {
            warn!(
                "addClient for {} returned a non-JSON {} body, treating as success",
                credential_id, status
            );
        }

        info!("Panel client {} created on inbound {}", credential_id, self.config.inbound_id);
        Ok(())
    }

    async fn delete_client(&self, credential_id: &str) -> Result<(), PanelError> {
        let mut last_error = None;

        for candidate in DELETE_CANDIDATES {
            match self.try_delete(candidate, credential_id).await {
                Ok(()) => {
                    info!("Panel client {} removed via {}", credential_id, candidate.path);
                    return Ok(());
                }
                Err(e) => {
                    debug!("Delete candidate rejected: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(PanelError::Delete {
            last_error: last_error.unwrap_or_else(|| "no delete candidates configured".to_string()),
        })
    }
}

impl HttpSession {
    async fn try_delete(
        &self,
        candidate: &DeleteCandidate,
        credential_id: &str,
    ) -> Result<(), String> {
        let path = candidate.path_for(self.config.inbound_id, credential_id);
        let mut request = self.http.post(self.config.url(&path));
        if let Some(body) = candidate.body_for(self.config.inbound_id, credential_id) {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("{} transport error: {}", path, e))?;

        let (status, text) = read_body(response).await;
        if !status.is_success() {
            return Err(format!(
                "{} HTTP {}: {}",
                path,
                status.as_u16(),
                truncate(&text, PROBE_BODY_LIMIT)
            ));
        }

        match serde_json::from_str::<Envelope>(&text) {
            Ok(envelope) if envelope.success == Some(false) => Err(format!(
                "{} failed: {}",
                path,
                truncate(&text, PROBE_BODY_LIMIT)
            )),
            _ => Ok(()),
        }
    }
}

/// Status plus body text; an unreadable body is treated as empty.
async fn read_body(response: Response) -> (reqwest::StatusCode, String) {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    (status, text)
}
