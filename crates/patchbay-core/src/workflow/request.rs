// ── Creation payloads ──
//
// Each variant maps to one flat JSON body for `POST /audio/output`.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::model::Parameters;

/// Label used for multiplexed outputs whose parent has no name.
pub const MULTIPLEX_FALLBACK_NAME: &str = "Multiplexed";

/// A request to create one output.
#[derive(Debug, Clone)]
pub enum OutputRequest {
    /// Open a physical device by its backend name.
    Device { name: String },
    /// Split channels off an existing output.
    Multiplex {
        parent_id: String,
        /// Channel selection, e.g. `"2"` or `"0,1"`.
        channels: String,
        /// Label to send; falls back to [`MULTIPLEX_FALLBACK_NAME`].
        display_name: Option<String>,
    },
    /// Stream to an Icecast mount point.
    Icecast {
        endpoint: String,
        password: SecretString,
    },
    /// Arbitrary flat body for types this client does not model.
    Raw(Parameters),
}

impl OutputRequest {
    /// Wire name of the requested type, if known.
    pub fn kind(&self) -> &str {
        match self {
            Self::Device { .. } => "device",
            Self::Multiplex { .. } => "multiplex",
            Self::Icecast { .. } => "icecast",
            Self::Raw(raw) => raw.get("type").and_then(Value::as_str).unwrap_or("raw"),
        }
    }

    /// Build the flat JSON body.
    pub fn to_payload(&self) -> Parameters {
        let mut body = Parameters::new();
        match self {
            Self::Device { name } => {
                body.insert("type".into(), "device".into());
                body.insert("display_name".into(), name.as_str().into());
                body.insert("name".into(), name.as_str().into());
            }
            Self::Multiplex {
                parent_id,
                channels,
                display_name,
            } => {
                let label = display_name.as_deref().unwrap_or(MULTIPLEX_FALLBACK_NAME);
                body.insert("type".into(), "multiplex".into());
                body.insert("display_name".into(), label.into());
                body.insert("parent_id".into(), parent_id.as_str().into());
                body.insert("channels".into(), channels.as_str().into());
            }
            Self::Icecast { endpoint, password } => {
                body.insert("type".into(), "icecast".into());
                body.insert("display_name".into(), endpoint.as_str().into());
                body.insert("endpoint".into(), endpoint.as_str().into());
                body.insert("password".into(), password.expose_secret().into());
            }
            Self::Raw(raw) => body.clone_from(raw),
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn payload(request: &OutputRequest) -> Value {
        Value::Object(request.to_payload())
    }

    #[test]
    fn device_payload_uses_name_as_label() {
        let request = OutputRequest::Device {
            name: "Speakers".into(),
        };
        assert_eq!(
            payload(&request),
            json!({ "type": "device", "display_name": "Speakers", "name": "Speakers" })
        );
    }

    #[test]
    fn multiplex_payload_carries_parent_label() {
        let request = OutputRequest::Multiplex {
            parent_id: "dev-1".into(),
            channels: "2".into(),
            display_name: Some("Line In".into()),
        };
        assert_eq!(
            payload(&request),
            json!({
                "type": "multiplex",
                "display_name": "Line In",
                "parent_id": "dev-1",
                "channels": "2"
            })
        );
    }

    #[test]
    fn multiplex_payload_falls_back_without_label() {
        let request = OutputRequest::Multiplex {
            parent_id: "missing".into(),
            channels: "0,1".into(),
            display_name: None,
        };
        assert_eq!(payload(&request)["display_name"], json!("Multiplexed"));
    }

    #[test]
    fn icecast_payload_exposes_password_only_in_body() {
        let request = OutputRequest::Icecast {
            endpoint: "http://radio.local:8000/live".into(),
            password: SecretString::from("hackme".to_owned()),
        };
        assert!(!format!("{request:?}").contains("hackme"));
        assert_eq!(
            payload(&request),
            json!({
                "type": "icecast",
                "display_name": "http://radio.local:8000/live",
                "endpoint": "http://radio.local:8000/live",
                "password": "hackme"
            })
        );
    }

    #[test]
    fn raw_payload_passes_through() {
        let mut raw = Parameters::new();
        raw.insert("type".into(), json!("rtp"));
        raw.insert("port".into(), json!(5004));
        let request = OutputRequest::Raw(raw.clone());
        assert_eq!(request.kind(), "rtp");
        assert_eq!(request.to_payload(), raw);
    }
}
