use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JWT claim set as a JSON object.
///
/// Values are strings, numbers, booleans, arrays or nested objects; nothing
/// about their shape is assumed until a caller resolves a specific claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `sub`
    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    /// `iat` as Unix seconds
    pub fn issued_at(&self) -> Option<i64> {
        self.get("iat").and_then(numeric_date)
    }

    /// `exp` as Unix seconds
    pub fn expires_at(&self) -> Option<i64> {
        self.get("exp").and_then(numeric_date)
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(claims: Map<String, Value>) -> Self {
        Self(claims)
    }
}

// NumericDate may be fractional
fn numeric_date(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|secs| secs.trunc() as i64))
}
