//! Read-only server and stream inspection.
//!
//! Everything here except the main stream lookup is best-effort: a failing
//! side request is logged and reported as absent.

use crate::classify::{CameraErrorEnvelope, CameraHealth};
use crate::error::Result;
use crate::models::{BroadcastStatistics, LiveStreamCount, RemoteStream, VersionInfo};
use crate::transport::Transport;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct ServerSummary {
    pub version: Option<VersionInfo>,
    pub active_live_streams: Option<u64>,
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct StreamDetail {
    pub stream: RemoteStream,
    pub statistics: Option<BroadcastStatistics>,
    /// Only requested for camera and RTSP-source streams.
    pub camera_health: Option<CameraHealth>,
}

impl StreamDetail {
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.stream
            .start_time
            .filter(|ms| *ms > 0)
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}

async fn best_effort<T: DeserializeOwned>(transport: &dyn Transport, path: &str) -> Option<T> {
    let response = match transport.get(path).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("{} unavailable: {}", path, e);
            return None;
        }
    };
    match response.require(path) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("{} unavailable: {}", path, e);
            None
        }
    }
}

/// Version, live count and histograms over an already fetched inventory.
pub async fn server_summary(
    transport: &dyn Transport,
    inventory: &[RemoteStream],
) -> ServerSummary {
    let version = best_effort::<VersionInfo>(transport, "/version").await;
    let active_live_streams =
        best_effort::<LiveStreamCount>(transport, "/broadcasts/active-live-stream-count")
            .await
            .map(|c| c.number);

    let mut by_status = BTreeMap::new();
    let mut by_type = BTreeMap::new();
    for stream in inventory {
        *by_status.entry(stream.status_or_unknown().to_string()).or_insert(0) += 1;
        *by_type.entry(stream.type_or_unknown().to_string()).or_insert(0) += 1;
    }

    ServerSummary {
        version,
        active_live_streams,
        total: inventory.len(),
        by_status,
        by_type,
    }
}

/// Looks up one stream. `Ok(None)` when the server answers 404.
pub async fn stream_detail(
    transport: &dyn Transport,
    stream_id: &str,
) -> Result<Option<StreamDetail>> {
    let path = format!("/broadcasts/{}", stream_id);
    let response = transport.get(&path).await?;
    if response.status == 404 {
        return Ok(None);
    }
    let stream: RemoteStream = response.require(&path)?;

    let statistics_path = format!("/broadcasts/{}/broadcast-statistics", stream_id);
    let statistics = best_effort(transport, &statistics_path).await;

    let camera_health = if stream.stream_type.is_some_and(|t| t.is_pulled()) {
        let camera_path = format!("/broadcasts/{}/ip-camera-error", stream_id);
        best_effort::<CameraErrorEnvelope>(transport, &camera_path)
            .await
            .map(CameraErrorEnvelope::health)
    } else {
        None
    };

    Ok(Some(StreamDetail {
        stream,
        statistics,
        camera_health,
    }))
}
