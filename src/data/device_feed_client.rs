//! Logger device-feed REST client.
//!
//! The feed serves the device listing and measurement XML for one device over
//! a time window from the same resource. Only credentials from the environment
//! are forwarded; there is no session state.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::error::AppError;

const DEVICES_PATH: &str = "/bluconsolerest/1.0/resources/devices";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
/// Default look-back window for device fetches.
pub const DEFAULT_WINDOW_HOURS: u32 = 48;

/// Time window in epoch seconds, `[from_s, to_s]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedWindow {
    pub from_s: i64,
    pub to_s: i64,
}

impl FeedWindow {
    /// The `hours` ending at `now`.
    pub fn ending_at(now: DateTime<Utc>, hours: u32) -> Self {
        let to_s = now.timestamp();
        Self {
            from_s: to_s - i64::from(hours) * 3600,
            to_s,
        }
    }
}

pub struct DeviceFeedClient {
    client: Client,
    base_url: String,
    user: String,
    password: String,
}

impl DeviceFeedClient {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("BLU_BASE")
            .map_err(|_| AppError::new(2, "Missing BLU_BASE in environment (.env)."))?;
        let user = std::env::var("BLU_USER")
            .map_err(|_| AppError::new(2, "Missing BLU_USER in environment (.env)."))?;
        let password = std::env::var("BLU_PASS")
            .map_err(|_| AppError::new(2, "Missing BLU_PASS in environment (.env)."))?;
        Self::new(base_url, user, password)
    }

    pub fn new(base_url: String, user: String, password: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user,
            password,
        })
    }

    /// Measurement XML for the last `hours` hours.
    pub fn fetch_recent(&self, device_id: &str, hours: u32) -> Result<String, AppError> {
        self.fetch_measurements(device_id, FeedWindow::ending_at(Utc::now(), hours))
    }

    pub fn fetch_measurements(&self, device_id: &str, window: FeedWindow) -> Result<String, AppError> {
        debug!(device_id, from = window.from_s, to = window.to_s, "fetching device feed");
        let body = self.get(&measurement_query(&self.user, &self.password, device_id, window))?;
        info!(device_id, bytes = body.len(), "fetched device feed");
        Ok(body)
    }

    /// Device listing XML; `children` also lists sub-account devices.
    pub fn fetch_devices(&self, children: Option<bool>) -> Result<String, AppError> {
        debug!(?children, "fetching device listing");
        let body = self.get(&listing_query(&self.user, &self.password, children))?;
        info!(bytes = body.len(), "fetched device listing");
        Ok(body)
    }

    fn get(&self, query: &[(&'static str, String)]) -> Result<String, AppError> {
        let url = format!("{}{DEVICES_PATH}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| AppError::new(4, format!("Device feed request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Device feed request failed with status {}.", resp.status()),
            ));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::new(4, format!("Failed to read device feed response: {e}")))?;
        if body.to_ascii_lowercase().contains("bad username or password") {
            return Err(AppError::new(4, "Device feed rejected the configured credentials."));
        }
        Ok(body)
    }
}

fn listing_query(user: &str, password: &str, children: Option<bool>) -> Vec<(&'static str, String)> {
    let mut query = vec![("uname", user.to_string()), ("upass", password.to_string())];
    if let Some(children) = children {
        query.push(("children", children.to_string()));
    }
    query
}

fn measurement_query(user: &str, password: &str, device_id: &str, window: FeedWindow) -> Vec<(&'static str, String)> {
    vec![
        ("uname", user.to_string()),
        ("upass", password.to_string()),
        ("id", device_id.to_string()),
        ("fromTime", window.from_s.to_string()),
        ("toTime", window.to_s.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn window_covers_requested_hours() {
        let now = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        let w = FeedWindow::ending_at(now, DEFAULT_WINDOW_HOURS);
        assert_eq!(w.to_s, now.timestamp());
        assert_eq!(w.to_s - w.from_s, 48 * 3600);
    }

    #[test]
    fn query_carries_credentials_and_window() {
        let q = measurement_query("u", "p", "42", FeedWindow { from_s: 10, to_s: 20 });
        let keys: Vec<&str> = q.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["uname", "upass", "id", "fromTime", "toTime"]);
        assert_eq!(q[3].1, "10");
        assert_eq!(q[4].1, "20");
    }

    #[test]
    fn listing_query_sends_children_only_when_set() {
        let q = listing_query("u", "p", None);
        assert_eq!(q, vec![("uname", "u".to_string()), ("upass", "p".to_string())]);
        let q = listing_query("u", "p", Some(false));
        assert_eq!(q[2], ("children", "false".to_string()));
        assert_eq!(listing_query("u", "p", Some(true))[2].1, "true");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let c = DeviceFeedClient::new("https://feed.example/".into(), "u".into(), "p".into()).unwrap();
        assert_eq!(c.base_url, "https://feed.example");
    }
}
