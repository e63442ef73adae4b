//! # Response Formatting
//!
//! Success bodies for the write endpoints. Reads return the bicycle (or
//! array of bicycles) directly.

use serde::Serialize;

/// `{"message": ...}` acknowledgement
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn updated() -> Self {
        Self {
            message: "Bicycle updated",
        }
    }

    pub fn deleted() -> Self {
        Self {
            message: "Bicycle deleted",
        }
    }
}

/// Create acknowledgement carrying the assigned id
#[derive(Debug, Clone, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub bicycle_id: String,
}

impl CreatedResponse {
    pub fn new(bicycle_id: String) -> Self {
        Self {
            message: "Bicycle created",
            bicycle_id,
        }
    }
}

/// Health check body
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
