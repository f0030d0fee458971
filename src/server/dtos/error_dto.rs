use serde::{Deserialize, Serialize};

/// body of every relay failure, `details` carries the parse or transport failure text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub details: Option<String>,
}
