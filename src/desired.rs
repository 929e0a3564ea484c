//! Desired stream definitions, from CSV rows or generated camera ranges,
//! and the create payloads built from them.

use crate::address::{camera_ip, camera_name};
use crate::config::ServerProfile;
use crate::error::{Error, Result};
use crate::models::{CameraDefaults, StreamPayload, StreamType};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

const RTSP_SCHEME: &str = "rtsp://";
const ONVIF_PATH: &str = "/cam/realmonitor?channel=1&subtype=0&unicast=true&proto=Onvif";
const WEBRTC_VIEWER_LIMIT: u32 = 10;
const BACKUP_SUFFIX: &str = "-1";

/// How a desired stream is registered on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Server pulls from the camera by IP with ONVIF credentials.
    IpCamera,
    /// Server pulls an explicit RTSP URL.
    StreamSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesiredStreamSpec {
    pub code: String,
    /// Camera IP or full `rtsp://` URL.
    pub source_address: Option<String>,
    pub credentials: Option<Credentials>,
    pub description: Option<String>,
    pub metadata: Option<String>,
    pub origin_address: String,
    pub camera_defaults: Option<CameraDefaults>,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    code: Option<String>,
    stream_ip: Option<String>,
    stream_username: Option<String>,
    stream_password: Option<String>,
    description: Option<String>,
    #[serde(rename = "metaData")]
    meta_data: Option<String>,
    #[serde(rename = "originAdress")]
    origin_address: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl DesiredStreamSpec {
    fn from_row(row: CsvRow, line: u64, profile: &ServerProfile) -> Result<Self> {
        let code = non_empty(row.code)
            .ok_or_else(|| Error::invalid(format!("row {}: missing 'code'", line)))?;

        let username = non_empty(row.stream_username);
        let password = non_empty(row.stream_password);
        let credentials = if username.is_some() || password.is_some() {
            Some(Credentials {
                username: username.unwrap_or_default(),
                password: password.unwrap_or_default(),
            })
        } else {
            None
        };

        Ok(Self {
            code,
            source_address: non_empty(row.stream_ip),
            credentials,
            description: non_empty(row.description),
            metadata: non_empty(row.meta_data),
            origin_address: non_empty(row.origin_address)
                .unwrap_or_else(|| profile.origin_ip.clone()),
            camera_defaults: None,
        })
    }

    /// Builds the create payload for `stream_id`.
    ///
    /// Fails when the row lacks the source address the kind needs.
    pub fn payload(&self, kind: StreamKind, stream_id: &str) -> Result<StreamPayload> {
        let source = self.source_address.as_deref().ok_or_else(|| {
            Error::invalid(format!("stream '{}' has no stream_ip", self.code))
        })?;
        let credentials = self.credentials.clone().unwrap_or_default();

        let mut payload = StreamPayload {
            stream_id: stream_id.to_string(),
            name: self.code.clone(),
            stream_type: StreamType::IpCamera,
            description: Some(self.description.clone().unwrap_or_default()),
            origin_address: Some(self.origin_address.clone()),
            webrtc_viewer_limit: Some(WEBRTC_VIEWER_LIMIT),
            meta_data: Some(self.metadata.clone().unwrap_or_default()),
            ip_addr: None,
            username: None,
            password: None,
            stream_url: None,
            defaults: self.camera_defaults.clone(),
        };

        match kind {
            StreamKind::IpCamera => {
                payload.ip_addr = Some(source.to_string());
                payload.username = Some(credentials.username);
                payload.password = Some(credentials.password);
            }
            StreamKind::StreamSource => {
                payload.stream_type = StreamType::StreamSource;
                payload.stream_url = Some(rtsp_url(source, &credentials));
            }
        }
        Ok(payload)
    }
}

/// Full RTSP URL for a source: passed through when it already carries the
/// scheme, otherwise built for the camera's ONVIF main stream.
pub fn rtsp_url(source: &str, credentials: &Credentials) -> String {
    let has_scheme = source
        .get(..RTSP_SCHEME.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(RTSP_SCHEME));
    if has_scheme {
        return source.to_string();
    }
    format!(
        "{}{}:{}@{}{}",
        RTSP_SCHEME, credentials.username, credentials.password, source, ONVIF_PATH
    )
}

/// Reads desired streams from CSV with a header row. Only `code` is required.
pub fn read_csv<R: Read>(reader: R, profile: &ServerProfile) -> Result<Vec<DesiredStreamSpec>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let has_code = reader.headers()?.iter().any(|h| h == "code");
    if !has_code {
        return Err(Error::invalid("CSV has no 'code' column"));
    }

    let mut specs = Vec::new();
    for record in reader.deserialize::<CsvRow>() {
        let row = record?;
        // Header is line 1.
        let line = specs.len() as u64 + 2;
        specs.push(DesiredStreamSpec::from_row(row, line, profile)?);
    }
    Ok(specs)
}

pub fn load_csv(path: &Path, profile: &ServerProfile) -> Result<Vec<DesiredStreamSpec>> {
    let file = std::fs::File::open(path)?;
    let specs = read_csv(file, profile)?;
    tracing::info!("Loaded {} stream definition(s) from {}", specs.len(), path.display());
    Ok(specs)
}

/// A contiguous block of cameras on one site subnet.
#[derive(Debug, Clone)]
pub struct CameraRange {
    pub zone: String,
    pub subnet: u8,
    pub start: u32,
    pub end: u32,
    pub credentials: Credentials,
    /// Backup feeds get a `-1` suffix on the name.
    pub backup: bool,
}

impl CameraRange {
    /// Expands the range into specs. All addressing errors surface here,
    /// before any request is made.
    pub fn specs(&self, profile: &ServerProfile) -> Result<Vec<DesiredStreamSpec>> {
        let zone = self.zone.trim().to_uppercase();
        if zone.is_empty() {
            return Err(Error::invalid("zone must not be empty"));
        }
        if self.start > self.end {
            return Err(Error::invalid(format!(
                "start id {} is after end id {}",
                self.start, self.end
            )));
        }

        (self.start..=self.end)
            .map(|id| {
                let ip = camera_ip(self.subnet, id)?;
                let mut code = camera_name(&zone, id);
                if self.backup {
                    code.push_str(BACKUP_SUFFIX);
                }
                Ok(DesiredStreamSpec {
                    code,
                    source_address: Some(ip),
                    credentials: Some(self.credentials.clone()),
                    description: None,
                    metadata: None,
                    origin_address: profile.origin_ip.clone(),
                    camera_defaults: Some(CameraDefaults::default()),
                })
            })
            .collect()
    }
}
