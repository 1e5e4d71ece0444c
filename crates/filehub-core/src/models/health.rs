use serde::{Deserialize, Serialize};

/// Payload of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub server: String,
    #[serde(default)]
    pub debug_mode: bool,
}

impl HealthStatus {
    pub fn is_running(&self) -> bool {
        self.server == "running"
    }
}
