use serde::{Deserialize, Serialize};

/// The recorded result of evaluating one sanity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanityCheck {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub satisfied: bool,
}
