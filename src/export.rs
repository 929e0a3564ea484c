//! Zone selection over the inventory and the CSV sheets handed to operators.

use crate::error::Result;
use crate::models::RemoteStream;
use std::io::Write;
use std::path::Path;

const BACKUP_SUFFIX: &str = "-1";

/// Streams whose name starts with `zone` (case-insensitive on the zone).
pub fn in_zone<'a>(inventory: &'a [RemoteStream], zone: &str) -> Vec<&'a RemoteStream> {
    let zone = zone.trim().to_uppercase();
    inventory
        .iter()
        .filter(|s| s.name.starts_with(&zone))
        .collect()
}

/// Primary (non-backup) streams of a zone, ordered by camera number.
pub fn primary_sheet<'a>(inventory: &'a [RemoteStream], zone: &str) -> Vec<&'a RemoteStream> {
    let mut rows: Vec<&RemoteStream> = in_zone(inventory, zone)
        .into_iter()
        .filter(|s| !s.name.ends_with(BACKUP_SUFFIX))
        .collect();
    rows.sort_by_key(|s| camera_number(&s.name));
    rows
}

/// Digits after the zone letter read as one number; names without digits
/// sort last.
fn camera_number(name: &str) -> u64 {
    let digits: String = name
        .chars()
        .skip(1)
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(u64::MAX)
}

/// `Name, Stream ID` rows for streams created in this run.
pub fn write_created<W: Write>(writer: W, rows: &[(String, String)]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Name", "Stream ID"])?;
    for (name, stream_id) in rows {
        csv.write_record([name, stream_id])?;
    }
    csv.flush()?;
    Ok(())
}

/// `Name, Stream ID, Camera IP` rows for an exported zone.
pub fn write_sheet<W: Write>(writer: W, streams: &[&RemoteStream]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Name", "Stream ID", "Camera IP"])?;
    for stream in streams {
        csv.write_record([
            stream.name.as_str(),
            stream.stream_id.as_str(),
            stream.ip_addr.as_deref().unwrap_or(""),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_sheet_file(path: &Path, streams: &[&RemoteStream]) -> Result<()> {
    write_sheet(std::fs::File::create(path)?, streams)
}
