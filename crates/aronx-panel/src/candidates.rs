use serde_json::{Value, json};

/// Payload carried by a delete candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteBody {
    /// Everything is in the path.
    Empty,
    /// `{"clientId": ...}`
    ClientId,
    /// `{"id": <inbound>, "clientId": ...}`
    InboundAndClientId,
}

/// One known shape of the panel's client-removal endpoint.
#[derive(Debug, Clone, Copy)]
pub struct DeleteCandidate {
    /// `{inbound}` and `{client}` are substituted before sending.
    pub path: &'static str,
    pub body: DeleteBody,
}

/// Tried in order, each once; the first accepted response wins.
/// New panel builds get a new entry here.
pub const DELETE_CANDIDATES: &[DeleteCandidate] = &[
    DeleteCandidate {
        path: "/panel/api/inbounds/{inbound}/delClient/{client}",
        body: DeleteBody::Empty,
    },
    DeleteCandidate {
        path: "/panel/api/inbounds/delClient",
        body: DeleteBody::InboundAndClientId,
    },
    DeleteCandidate {
        path: "/panel/api/inbounds/delClient",
        body: DeleteBody::ClientId,
    },
    DeleteCandidate {
        path: "/panel/api/inbounds/removeClient",
        body: DeleteBody::InboundAndClientId,
    },
    DeleteCandidate {
        path: "/panel/api/inbounds/removeClient",
        body: DeleteBody::ClientId,
    },
];

impl DeleteCandidate {
    pub fn path_for(&self, inbound_id: i64, credential_id: &str) -> String {
        self.path
            .replace("{inbound}", &inbound_id.to_string())
            .replace("{client}", credential_id)
    }

    pub fn body_for(&self, inbound_id: i64, credential_id: &str) -> Option<Value> {
        match self.body {
            DeleteBody::Empty => None,
            DeleteBody::ClientId => Some(json!({ "clientId": credential_id })),
            DeleteBody::InboundAndClientId => {
                Some(json!({ "id": inbound_id, "clientId": credential_id }))
            }
        }
    }
}
