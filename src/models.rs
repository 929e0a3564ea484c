use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// --- Remote inventory models ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StreamType {
    #[serde(rename = "ipCamera")]
    IpCamera,
    #[serde(rename = "streamSource")]
    StreamSource,
    #[serde(rename = "liveStream")]
    LiveStream,
    #[serde(rename = "playlist")]
    Playlist,
    #[serde(other)]
    Other,
}

impl StreamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::IpCamera => "ipCamera",
            StreamType::StreamSource => "streamSource",
            StreamType::LiveStream => "liveStream",
            StreamType::Playlist => "playlist",
            StreamType::Other => "other",
        }
    }

    /// Stream types pulled from a camera or RTSP source, which expose the
    /// camera-error diagnostic.
    pub fn is_pulled(&self) -> bool {
        matches!(self, StreamType::IpCamera | StreamType::StreamSource)
    }
}

/// One broadcast as returned by the listing and detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStream {
    pub stream_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, rename = "type")]
    pub stream_type: Option<StreamType>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ip_addr: Option<String>,
    #[serde(default)]
    pub stream_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hls_viewer_count: u64,
    #[serde(
        default,
        rename = "webRTCViewerCount",
        deserialize_with = "null_as_default"
    )]
    pub webrtc_viewer_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rtmp_viewer_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dash_viewer_count: u64,
    /// Epoch milliseconds.
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RemoteStream {
    pub fn status_or_unknown(&self) -> &str {
        self.status.as_deref().unwrap_or("unknown")
    }

    pub fn type_or_unknown(&self) -> &str {
        self.stream_type.as_ref().map_or("unknown", StreamType::as_str)
    }
}

/// Servers send `null` for unset names and counters; treat it like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// --- Create payload ---

/// JSON body for `POST /broadcasts/create`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamPayload {
    pub stream_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub stream_type: StreamType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    // Field name is misspelled on the server side.
    #[serde(rename = "originAdress", skip_serializing_if = "Option::is_none")]
    pub origin_address: Option<String>,
    #[serde(rename = "webRTCViewerLimit", skip_serializing_if = "Option::is_none")]
    pub webrtc_viewer_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    #[serde(flatten)]
    pub defaults: Option<CameraDefaults>,
}

/// Fixed counters and playback flags sent with range-created cameras.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraDefaults {
    pub hls_viewer_count: u32,
    pub dash_viewer_count: u32,
    #[serde(rename = "webRTCViewerCount")]
    pub webrtc_viewer_count: u32,
    pub rtmp_viewer_count: u32,
    pub mp4_enabled: u32,
    pub playlist_loop_enabled: bool,
    pub auto_start_stop_enabled: bool,
    pub planned_start_date: i64,
    pub play_list_item_list: Vec<Value>,
}

impl Default for CameraDefaults {
    fn default() -> Self {
        Self {
            hls_viewer_count: 0,
            dash_viewer_count: 0,
            webrtc_viewer_count: 0,
            rtmp_viewer_count: 0,
            mp4_enabled: 0,
            playlist_loop_enabled: true,
            auto_start_stop_enabled: false,
            planned_start_date: 0,
            play_list_item_list: Vec::new(),
        }
    }
}

// --- Diagnostics models ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    #[serde(default)]
    pub version_name: Option<String>,
    #[serde(default)]
    pub version_type: Option<String>,
    #[serde(default)]
    pub build_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveStreamCount {
    #[serde(default)]
    pub number: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastStatistics {
    #[serde(default, rename = "totalHLSWatchersCount")]
    pub hls: i64,
    #[serde(default, rename = "totalWebRTCWatchersCount")]
    pub webrtc: i64,
    #[serde(default, rename = "totalRTMPWatchersCount")]
    pub rtmp: i64,
    #[serde(default, rename = "totalDASHWatchersCount")]
    pub dash: i64,
}
