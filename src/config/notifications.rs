//! Notification gateway configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Notification gateway configuration.
///
/// The gateway is optional; without one, dispatch is a logged no-op.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationsConfig {
    /// Endpoint receiving transition announcements
    pub gateway_url: Option<String>,

    /// Timeout for gateway calls, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl NotificationsConfig {
    /// Validate notification configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.gateway_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidGatewayUrl);
            }
        }
        Ok(())
    }
}

fn default_request_timeout() -> u64 {
    5
}
