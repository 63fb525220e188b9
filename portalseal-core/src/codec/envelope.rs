use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use super::bundle::EncryptedBundle;

/// Endpoint class of a protected response; selects the envelope field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleClass {
    /// Any JSON body, wrapped as `{"data": body}` before encryption.
    Generic,
    /// Identity claims.
    User,
    /// Admin settings.
    Settings,
    /// Login configuration.
    Config,
}

impl BundleClass {
    pub const ALL: [BundleClass; 4] = [
        BundleClass::Generic,
        BundleClass::User,
        BundleClass::Settings,
        BundleClass::Config,
    ];

    pub fn field_name(self) -> &'static str {
        match self {
            BundleClass::Generic => "enc",
            BundleClass::User => "encUser",
            BundleClass::Settings => "encSettings",
            BundleClass::Config => "encConfig",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.field_name() == name)
    }
}

/// A response body, classified once at the boundary.
///
/// On the wire an encrypted body is a single-field object keyed by the class
/// field name; anything else is plain JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    Encrypted {
        class: BundleClass,
        bundle: EncryptedBundle,
    },
    Plain(Value),
}

impl ResponseEnvelope {
    pub fn encrypted(class: BundleClass, bundle: EncryptedBundle) -> Self {
        ResponseEnvelope::Encrypted { class, bundle }
    }

    /// Decide whether a JSON body carries a bundle. Only an object with exactly
    /// one recognised field holding a well-formed bundle counts as encrypted.
    pub fn classify(body: Value) -> Self {
        let single = match &body {
            Value::Object(map) if map.len() == 1 => map.iter().next(),
            _ => None,
        };

        if let Some((name, inner)) = single {
            if let Some(class) = BundleClass::from_field_name(name) {
                if let Ok(bundle) = EncryptedBundle::deserialize(inner) {
                    return ResponseEnvelope::Encrypted { class, bundle };
                }
            }
        }

        ResponseEnvelope::Plain(body)
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, ResponseEnvelope::Encrypted { .. })
    }
}

impl Serialize for ResponseEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResponseEnvelope::Encrypted { class, bundle } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(class.field_name(), bundle)?;
                map.end()
            }
            ResponseEnvelope::Plain(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ResponseEnvelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ResponseEnvelope::classify)
    }
}
