//! # Blob Metadata

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata describing a stored blob, always derived from the medium
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobInfo {
    pub key: String,
    pub size: u64,
    pub mod_time: DateTime<Utc>,
}

impl BlobInfo {
    /// Create a new blob info
    pub fn new(key: impl Into<String>, size: u64, mod_time: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            size,
            mod_time,
        }
    }

    /// Create from a filesystem modification time
    pub fn from_system_time(key: impl Into<String>, size: u64, modified: SystemTime) -> Self {
        Self::new(key, size, DateTime::<Utc>::from(modified))
    }

    /// Modification time formatted as an HTTP-date (RFC 7231 IMF-fixdate)
    pub fn last_modified_http(&self) -> String {
        http_date(&self.mod_time)
    }
}

/// Format a timestamp as an HTTP-date
pub fn http_date(time: &DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// A page of listing results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    pub items: Vec<BlobInfo>,
    /// Key to pass as `after` to fetch the next page; `None` on the last page
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_serializes_camel_case() {
        let time = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        let info = BlobInfo::new("report.pdf", 42, time);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["key"], "report.pdf");
        assert_eq!(json["size"], 42);
        assert_eq!(json["modTime"], "2024-03-09T14:05:00Z");
    }

    #[test]
    fn test_http_date() {
        let time = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        let info = BlobInfo::new("k", 0, time);
        assert_eq!(info.last_modified_http(), "Sun, 06 Nov 1994 08:49:37 GMT");
    }
}
