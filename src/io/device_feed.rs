//! Logger device-feed XML.
//!
//! The feed lists devices as `<tdl>`, `<htdl>` or `<ltdl>` elements, each with
//! an `<id>` and a `<ms>` block of `<m>` measurements:
//!
//! ```xml
//! <devices>
//!   <tdl>
//!     <id>1234</id>
//!     <ms>
//!       <m><t>4.2</t><h>61</h><utc>1700000000</utc></m>
//!     </ms>
//!   </tdl>
//! </devices>
//! ```
//!
//! `utc` is epoch seconds; measurements without one are dropped.
//!
//! The device listing uses the same device elements with descriptive children
//! (`label`, `org`, `min_temp`, `max_temp`, `vrn`, `battery`).

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Serialize;
use tracing::debug;

use crate::domain::SeriesPoint;
use crate::error::AppError;

const DEVICE_TAGS: [&str; 3] = ["tdl", "htdl", "ltdl"];
/// Battery level tags, in lookup order.
const BATTERY_TAGS: [&str; 3] = ["battery", "bat", "batt"];

/// One logger as listed by the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub id: Option<String>,
    pub label: Option<String>,
    pub org: Option<String>,
    pub min_temp_c: Option<f64>,
    pub max_temp_c: Option<f64>,
    pub vrn: Option<String>,
    pub battery: Option<f64>,
    /// Device element tag (`tdl`, `htdl`, `ltdl`).
    pub device_type: String,
}

impl DeviceInfo {
    fn from_fields(device_type: String, fields: &HashMap<String, String>) -> Self {
        let text = |tag: &str| {
            fields
                .get(tag)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            id: text("id"),
            label: text("label"),
            org: text("org"),
            min_temp_c: text("min_temp").and_then(|v| parse_float(&v)),
            max_temp_c: text("max_temp").and_then(|v| parse_float(&v)),
            vrn: text("vrn"),
            // First non-empty battery tag wins, even if it is not a number.
            battery: BATTERY_TAGS.iter().find_map(|t| text(t)).and_then(|v| parse_float(&v)),
            device_type,
        }
    }
}

/// Parse the device listing.
pub fn parse_devices(xml: &str) -> Result<Vec<DeviceInfo>, AppError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut stack: Vec<String> = Vec::new();
    // Device tag and the text of its direct children.
    let mut current: Option<(String, HashMap<String, String>)> = None;
    let mut out = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if stack.len() == 1 && DEVICE_TAGS.contains(&name.as_str()) {
                    current = Some((name.clone(), HashMap::new()));
                }
                stack.push(name);
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                stack.pop();
                if stack.len() == 1 && DEVICE_TAGS.contains(&name.as_str()) {
                    if let Some((kind, fields)) = current.take() {
                        out.push(DeviceInfo::from_fields(kind, &fields));
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let (Some((_, fields)), 3, Some(tag)) = (current.as_mut(), stack.len(), stack.last()) {
                    let text = e.unescape().unwrap_or_default().to_string();
                    fields.entry(tag.clone()).or_insert(text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(feed_error(reader.buffer_position(), e)),
            _ => {}
        }
        buf.clear();
    }

    debug!(devices = out.len(), "parsed device listing");
    Ok(out)
}

/// One measurement as found in the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub device_id: Option<String>,
    /// Device element tag (`tdl`, `htdl`, `ltdl`).
    pub device_type: String,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub utc_s: Option<i64>,
}

#[derive(Debug, Default)]
struct PendingMeasurement {
    t: String,
    h: String,
    utc: String,
}

/// Parse every measurement, optionally keeping only one device.
pub fn parse_measurements(xml: &str, device_id: Option<&str>) -> Result<Vec<Measurement>, AppError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    // An empty filter keeps every device.
    let wanted = device_id.map(str::trim).filter(|w| !w.is_empty());

    // Open element names from the root down.
    let mut stack: Vec<String> = Vec::new();
    let mut device_type: Option<String> = None;
    let mut current_id = String::new();
    let mut device_points: Vec<PendingMeasurement> = Vec::new();
    let mut pending: Option<PendingMeasurement> = None;
    let mut out = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                // Devices are direct children of the root element.
                if stack.len() == 1 && DEVICE_TAGS.contains(&name.as_str()) {
                    device_type = Some(name.clone());
                    current_id.clear();
                    device_points.clear();
                } else if device_type.is_some() && name == "m" && stack.last().is_some_and(|p| p == "ms") {
                    pending = Some(PendingMeasurement::default());
                }
                stack.push(name);
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                stack.pop();
                if name == "m" {
                    if let Some(m) = pending.take() {
                        device_points.push(m);
                    }
                } else if stack.len() == 1 && DEVICE_TAGS.contains(&name.as_str()) {
                    if let Some(kind) = device_type.take() {
                        let id = current_id.trim();
                        let keep = wanted.is_none_or(|want| want == id);
                        if keep {
                            let id = (!id.is_empty()).then(|| id.to_string());
                            out.extend(device_points.drain(..).map(|m| Measurement {
                                device_id: id.clone(),
                                device_type: kind.clone(),
                                temperature_c: parse_float(&m.t),
                                humidity_pct: parse_float(&m.h),
                                utc_s: parse_int(&m.utc),
                            }));
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                let tag = stack.last().map(String::as_str).unwrap_or_default();
                if let Some(m) = pending.as_mut() {
                    match tag {
                        "t" => m.t = text,
                        "h" => m.h = text,
                        "utc" => m.utc = text,
                        _ => {}
                    }
                } else if device_type.is_some() && tag == "id" && stack.len() == 3 {
                    current_id = text;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(feed_error(reader.buffer_position(), e)),
            _ => {}
        }
        buf.clear();
    }

    debug!(measurements = out.len(), "parsed device feed");
    Ok(out)
}

/// Convert measurements into series points (`utc * 1000` ms).
///
/// Measurements with a missing or zero `utc` are dropped.
pub fn measurements_to_points(measurements: &[Measurement]) -> Vec<SeriesPoint> {
    measurements
        .iter()
        .filter_map(|m| {
            let utc = m.utc_s.filter(|&s| s != 0)?;
            Some(SeriesPoint::new(utc.checked_mul(1000)?, m.temperature_c))
        })
        .collect()
}

fn feed_error(position: u64, e: quick_xml::Error) -> AppError {
    AppError::new(4, format!("Device feed XML parse error at byte {position}: {e}"))
}

fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer part of a possibly fractional number (`"1700000000.0"`).
fn parse_int(s: &str) -> Option<i64> {
    let v = parse_float(s)?;
    (v.abs() < i64::MAX as f64).then(|| v.trunc() as i64)
}
