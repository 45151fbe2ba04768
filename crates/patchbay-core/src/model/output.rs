// ── Output domain type ──
//
// An output is a flat JSON object on the wire. Three keys are reserved
// (`type`, `id`, `display_name`); everything else is variant-specific and
// kept verbatim in `parameters`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Variant-specific fields of an output, exactly as the backend sent them.
pub type Parameters = Map<String, Value>;

const KEY_TYPE: &str = "type";
const KEY_ID: &str = "id";
const KEY_DISPLAY_NAME: &str = "display_name";

// ── OutputId ─────────────────────────────────────────────────────────

/// Backend-assigned output identifier. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputId(String);

impl OutputId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for OutputId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OutputId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── OutputKind ───────────────────────────────────────────────────────

/// The `type` discriminant. Unknown types pass through as [`Other`](Self::Other).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Device,
    Multiplex,
    Icecast,
    Other(String),
}

impl OutputKind {
    /// Wire spelling of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Device => "device",
            Self::Multiplex => "multiplex",
            Self::Icecast => "icecast",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for OutputKind {
    fn from(s: &str) -> Self {
        match s {
            "device" => Self::Device,
            "multiplex" => Self::Multiplex,
            "icecast" => Self::Icecast,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Output ───────────────────────────────────────────────────────────

/// A logical audio output: a physical device, a multiplexed sub-channel
/// of another output, or a network stream.
///
/// Built only from backend payloads via [`Output::from_raw`] (or serde,
/// which goes through the same path). `kind` has no setter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Parameters", into = "Parameters")]
pub struct Output {
    kind: Option<OutputKind>,
    id: Option<OutputId>,
    display_name: Option<String>,
    parameters: Parameters,
}

/// Borrowed, exhaustively matchable view of an output's variant fields.
///
/// Produced by [`Output::variant`]; never rewrites the parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputVariant<'a> {
    Device {
        /// Backend device name (e.g. an ALSA card).
        name: Option<&'a str>,
    },
    Multiplex {
        parent_id: Option<&'a str>,
        /// Channel selection, passed through as sent.
        channels: Option<&'a Value>,
    },
    Icecast {
        endpoint: Option<&'a str>,
    },
    Unknown {
        kind: Option<&'a OutputKind>,
        parameters: &'a Parameters,
    },
}

impl Output {
    /// Split a flat backend mapping into reserved fields and parameters.
    ///
    /// Never fails: missing reserved keys become `None`, and every other key
    /// moves into `parameters` untouched.
    pub fn from_raw(mut raw: Parameters) -> Self {
        let kind = raw.remove(KEY_TYPE).and_then(|v| match v {
            Value::Null => None,
            Value::String(s) => Some(OutputKind::from(s.as_str())),
            other => Some(OutputKind::Other(other.to_string())),
        });
        let id = raw.remove(KEY_ID).and_then(scalar_text).map(OutputId::from);
        let display_name = raw.remove(KEY_DISPLAY_NAME).and_then(scalar_text);

        Self {
            kind,
            id,
            display_name,
            parameters: raw,
        }
    }

    /// Flatten back into the wire shape. Inverse of [`from_raw`](Self::from_raw).
    pub fn into_raw(self) -> Parameters {
        let mut raw = self.parameters;
        if let Some(kind) = self.kind {
            raw.insert(KEY_TYPE.into(), Value::String(kind.as_str().to_owned()));
        }
        if let Some(id) = self.id {
            raw.insert(KEY_ID.into(), Value::String(id.0));
        }
        if let Some(name) = self.display_name {
            raw.insert(KEY_DISPLAY_NAME.into(), Value::String(name));
        }
        raw
    }

    pub fn kind(&self) -> Option<&OutputKind> {
        self.kind.as_ref()
    }

    pub fn id(&self) -> Option<&OutputId> {
        self.id.as_ref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// A string parameter, or `None` when absent or not a string.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    pub fn is_device(&self) -> bool {
        self.kind == Some(OutputKind::Device)
    }

    /// Best human label: display name, then id, then kind.
    pub fn label(&self) -> &str {
        self.display_name()
            .or_else(|| self.id().map(OutputId::as_str))
            .or_else(|| self.kind().map(OutputKind::as_str))
            .unwrap_or("(unnamed)")
    }

    pub fn variant(&self) -> OutputVariant<'_> {
        match &self.kind {
            Some(OutputKind::Device) => OutputVariant::Device {
                name: self.param_str("name"),
            },
            Some(OutputKind::Multiplex) => OutputVariant::Multiplex {
                parent_id: self.param_str("parent_id"),
                channels: self.parameters.get("channels"),
            },
            Some(OutputKind::Icecast) => OutputVariant::Icecast {
                endpoint: self.param_str("endpoint"),
            },
            kind => OutputVariant::Unknown {
                kind: kind.as_ref(),
                parameters: &self.parameters,
            },
        }
    }
}

impl From<Parameters> for Output {
    fn from(raw: Parameters) -> Self {
        Self::from_raw(raw)
    }
}

impl From<Output> for Parameters {
    fn from(output: Output) -> Self {
        output.into_raw()
    }
}

/// Strings as-is, numbers by their decimal text, other values by their
/// JSON text. `null` means absent.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw(value: Value) -> Parameters {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn from_raw_moves_extra_keys_into_parameters() {
        let output = Output::from_raw(raw(json!({
            "type": "icecast",
            "id": "o-2",
            "display_name": "http://radio/live",
            "endpoint": "http://radio/live",
            "password": "hunter2",
            "bitrate": 128
        })));

        assert_eq!(output.kind(), Some(&OutputKind::Icecast));
        assert_eq!(output.id(), Some(&OutputId::new("o-2")));
        assert_eq!(output.display_name(), Some("http://radio/live"));
        assert_eq!(
            output.parameters(),
            &raw(json!({
                "endpoint": "http://radio/live",
                "password": "hunter2",
                "bitrate": 128
            }))
        );
    }

    #[test]
    fn missing_reserved_keys_are_none() {
        let output = Output::from_raw(raw(json!({ "name": "hw:0" })));
        assert!(output.kind().is_none());
        assert!(output.id().is_none());
        assert!(output.display_name().is_none());
        assert_eq!(output.parameters().len(), 1);
        assert_eq!(output.label(), "(unnamed)");
    }

    #[test]
    fn numeric_id_becomes_decimal_text() {
        let output = Output::from_raw(raw(json!({ "type": "device", "id": 7, "display_name": null })));
        assert_eq!(output.id().map(OutputId::as_str), Some("7"));
        assert!(output.display_name().is_none());
        assert_eq!(output.label(), "7");
    }

    #[test]
    fn unknown_type_passes_through() {
        let output = Output::from_raw(raw(json!({ "type": "rtp", "id": "o-9", "port": 5004 })));
        assert_eq!(output.kind(), Some(&OutputKind::Other("rtp".into())));
        match output.variant() {
            OutputVariant::Unknown { kind, parameters } => {
                assert_eq!(kind.map(OutputKind::as_str), Some("rtp"));
                assert_eq!(parameters["port"], json!(5004));
            }
            other => panic!("expected Unknown, got {other:?}"),
        }
    }

    #[test]
    fn variant_views_read_parameters() {
        let device = Output::from_raw(raw(json!({ "type": "device", "name": "hw:0" })));
        assert!(device.is_device());
        assert_eq!(device.variant(), OutputVariant::Device { name: Some("hw:0") });

        let mux = Output::from_raw(raw(json!({
            "type": "multiplex", "parent_id": "dev-1", "channels": "2"
        })));
        assert!(!mux.is_device());
        assert_eq!(
            mux.variant(),
            OutputVariant::Multiplex {
                parent_id: Some("dev-1"),
                channels: Some(&json!("2")),
            }
        );
    }

    #[test]
    fn serde_round_trips_the_flat_shape() {
        let wire = json!({
            "type": "device",
            "id": "o-7",
            "display_name": "Speakers",
            "name": "Speakers"
        });
        let output: Output = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(output.parameters(), &raw(json!({ "name": "Speakers" })));
        assert_eq!(serde_json::to_value(&output).unwrap(), wire);
    }

    #[test]
    fn non_string_type_is_rendered_as_json_text() {
        let output = Output::from_raw(raw(json!({ "type": 3 })));
        assert_eq!(output.kind(), Some(&OutputKind::Other("3".into())));
    }
}
