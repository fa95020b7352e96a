use serde::{Deserialize, Serialize};

use crate::{layout::element::LayoutPayload, pipeline::ParsedLayout};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            message: "Layout Parser API is running".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseLayoutResponse {
    pub success: bool,
    pub layout: Vec<LayoutPayload>,
    pub image_with_layout: String,
    pub element_count: usize,
}

impl From<ParsedLayout> for ParseLayoutResponse {
    fn from(parsed: ParsedLayout) -> Self {
        Self {
            success: true,
            layout: parsed.layout,
            image_with_layout: parsed.image_with_layout,
            element_count: parsed.element_count,
        }
    }
}
