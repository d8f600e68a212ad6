pub mod candidate;

use serde::{Deserialize, Serialize};

/// Standard response envelope shared by every API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            status: true,
            message: message.into(),
            data: Some(data),
        }
    }
}
