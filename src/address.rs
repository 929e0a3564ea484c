//! Camera addressing for the numeric-range workflow.
//!
//! Cameras live on `192.168.<subnet>.0/24` and are numbered per site. The
//! numbering blocks do not line up with the host octets, so each subnet has
//! its own hand-maintained offset.

use crate::error::{Error, Result};

/// Last octet of the camera IP for `numeric_id` on `subnet`.
pub fn last_octet(subnet: u8, numeric_id: u32) -> Result<u32> {
    let octet = match subnet {
        11 => numeric_id,
        12 => offset(numeric_id, 200)?,
        14 | 15 => offset(numeric_id, 300)?,
        13 => {
            if numeric_id > 400 {
                numeric_id - 400
            } else if numeric_id > 300 {
                numeric_id - 300
            } else {
                numeric_id
            }
        }
        other => return Err(Error::UnsupportedSubnet(other)),
    };
    Ok(octet)
}

fn offset(numeric_id: u32, base: u32) -> Result<u32> {
    numeric_id.checked_sub(base).ok_or_else(|| {
        Error::invalid(format!(
            "camera id {} is below the block base {}",
            numeric_id, base
        ))
    })
}

/// Full camera IP, e.g. `192.168.13.50`.
pub fn camera_ip(subnet: u8, numeric_id: u32) -> Result<String> {
    let octet = last_octet(subnet, numeric_id)?;
    if octet > 255 {
        return Err(Error::invalid(format!(
            "camera id {} maps outside subnet {} (octet {})",
            numeric_id, subnet, octet
        )));
    }
    Ok(format!("192.168.{}.{}", subnet, octet))
}

/// Stream name for a camera slot: the zone followed by the id, with a leading
/// zero for ids up to and including 100.
pub fn camera_name(zone: &str, numeric_id: u32) -> String {
    if numeric_id > 100 {
        format!("{}{}", zone, numeric_id)
    } else {
        format!("{}0{}", zone, numeric_id)
    }
}
