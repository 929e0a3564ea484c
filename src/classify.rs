//! Interpretation of the server's response envelopes.
//!
//! Lifecycle calls (start/stop) answer with a result envelope whose `success`
//! flag is the verdict. Create and delete echo the broadcast back, so the
//! presence of `streamId` is the verdict. The camera-error check reuses the
//! `success` name with the opposite meaning and has its own type that does
//! not implement [`Envelope`].

use crate::transport::ApiResponse;
use serde::de::DeserializeOwned;
use serde::Deserialize;

const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub success: bool,
    pub message: String,
}

impl Verdict {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// A response body shape that carries a success/failure verdict.
pub trait Envelope: DeserializeOwned {
    fn verdict(self) -> Verdict;

    fn classify(response: &ApiResponse) -> Verdict {
        if !response.is_success() {
            return Verdict::failed(format!("HTTP {}", response.status));
        }
        match response.json::<Self>() {
            Ok(envelope) => envelope.verdict(),
            Err(e) => Verdict::failed(format!("invalid response body: {}", e)),
        }
    }
}

/// `{success, message}` returned by start and stop.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl Envelope for ResultEnvelope {
    fn verdict(self) -> Verdict {
        if self.success {
            Verdict::ok()
        } else {
            Verdict::failed(self.message.unwrap_or_else(|| UNKNOWN_ERROR.to_string()))
        }
    }
}

/// Broadcast echo returned by create and delete.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEnvelope {
    #[serde(default)]
    pub stream_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Envelope for ResourceEnvelope {
    fn verdict(self) -> Verdict {
        match self.stream_id {
            Some(id) if !id.is_empty() => Verdict::ok(),
            _ => Verdict::failed(self.message.unwrap_or_else(|| UNKNOWN_ERROR.to_string())),
        }
    }
}

/// Body of `GET /broadcasts/{id}/ip-camera-error`.
///
/// `success: true` means an error *was found* for the camera.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CameraErrorEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraHealth {
    Healthy,
    Fault(String),
}

impl CameraErrorEnvelope {
    pub fn health(self) -> CameraHealth {
        if self.success {
            CameraHealth::Fault(self.message.unwrap_or_else(|| "N/A".to_string()))
        } else {
            CameraHealth::Healthy
        }
    }
}
