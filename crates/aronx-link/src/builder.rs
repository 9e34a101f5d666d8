use crate::config::{LinkConfig, LinkError};

use urlencoding::encode;

const FLOW: &str = "xtls-rprx-vision";
const LABEL: &str = "AronxVPN";

/// Build the connection URI for `credential_id`.
pub fn build_link(credential_id: &str, config: &LinkConfig) -> Result<String, LinkError> {
    let c = config.resolve()?;

    Ok(format!(
        "vless://{id}@{host}:{port}/?type=tcp&encryption=none&security=reality\
         &pbk={pbk}&fp={fp}&sni={sni}&sid={sid}&spx={spx}&flow={FLOW}#{LABEL}",
        id = encode(credential_id),
        host = encode(c.server_host),
        port = encode(c.server_port),
        pbk = encode(c.public_key),
        fp = encode(c.fingerprint),
        sni = encode(c.server_name),
        sid = encode(c.short_id),
        spx = encode(c.url_path),
    ))
}
