//! Typed conversational state carried between turns

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::AddressContext;

/// State the skill keeps in the host's session attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Resolved home location, once geocoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressContext>,
    /// Number of turns handled in this session
    #[serde(default)]
    pub turn: u32,
    /// Name of the last intent handled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_intent: Option<String>,
}

impl SessionState {
    /// Read state from raw session attributes. Unknown or malformed
    /// attributes start a fresh state instead of failing the turn.
    #[must_use]
    pub fn from_attributes(attributes: Option<&Map<String, Value>>) -> Self {
        let Some(attributes) = attributes else {
            return Self::default();
        };
        match serde_json::from_value(Value::Object(attributes.clone())) {
            Ok(state) => state,
            Err(e) => {
                warn!("Discarding malformed session attributes: {}", e);
                Self::default()
            }
        }
    }

    /// Serialize back into session attributes
    #[must_use]
    pub fn to_attributes(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Record that a turn was handled
    pub fn advance(&mut self, intent: Option<&str>) {
        self.turn += 1;
        if let Some(intent) = intent {
            self.last_intent = Some(intent.to_string());
        }
    }
}
