//! Observation feed.
//!
//! The host delivers one JSON object per line:
//!
//! ```text
//! {"kind":"completed","url":"https://a.test/","type":"image","responseHeaders":[{"name":"Content-Length","value":"512"}]}
//! {"kind":"sendHeaders","url":"https://a.test/up","type":"xmlhttprequest","requestHeaders":[]}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. Malformed lines and
//! events that carry no header list for their kind are logged and skipped;
//! they never stop the feed. An empty header list is still an observation
//! and falls back to the category estimate.

use bytewatch_core::{Direction, NetworkObservation, ResourceCategory};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::error::MonitorError;
use crate::monitor::MonitorHandle;

/// Host event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedKind {
    /// A response finished.
    Completed,
    /// Request headers were sent.
    SendHeaders,
}

/// One header pair. Hosts may omit the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedHeader {
    /// Header name.
    pub name: String,
    /// Header value.
    #[serde(default)]
    pub value: Option<String>,
}

/// One decoded feed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEvent {
    /// Event kind.
    pub kind: FeedKind,
    /// Request URL.
    pub url: String,
    /// Host resource-type tag.
    #[serde(rename = "type", default)]
    pub resource_type: String,
    /// Response headers, if the host provided them.
    #[serde(default)]
    pub response_headers: Option<Vec<FeedHeader>>,
    /// Request headers, if the host provided them.
    #[serde(default)]
    pub request_headers: Option<Vec<FeedHeader>>,
}

impl FeedEvent {
    /// Converts to an observation, reading the header list that matches the
    /// event kind. Returns `None` when that list is absent.
    pub fn into_observation(self) -> Option<NetworkObservation> {
        let (direction, headers) = match self.kind {
            FeedKind::Completed => (Direction::Response, self.response_headers),
            FeedKind::SendHeaders => (Direction::Request, self.request_headers),
        };
        let headers = headers?;
        let pairs = headers
            .iter()
            .filter_map(|h| h.value.as_deref().map(|v| (h.name.as_str(), v)));

        Some(NetworkObservation::from_headers(
            self.url,
            ResourceCategory::from_tag(&self.resource_type),
            direction,
            pairs,
        ))
    }
}

fn is_filler(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Decodes one line. Returns `None` for blank and comment lines and for
/// events without headers.
///
/// # Errors
///
/// Returns `MonitorError::Feed` if the line is not a valid event.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<NetworkObservation>, MonitorError> {
    if is_filler(line) {
        return Ok(None);
    }
    serde_json::from_str::<FeedEvent>(line.trim())
        .map(FeedEvent::into_observation)
        .map_err(|e| MonitorError::Feed {
            line: line_no,
            message: e.to_string(),
        })
}

/// Counts from one feed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    /// Lines read.
    pub lines: usize,
    /// Observations handed to the monitor.
    pub forwarded: usize,
    /// Malformed lines and header-less events skipped.
    pub skipped: usize,
}

/// Reads `reader` to the end, forwarding every observation to the monitor.
///
/// # Errors
///
/// Returns an IO error from the reader, or `MonitorError::Closed` if the
/// monitor stops first.
pub async fn pump<R>(reader: R, monitor: &MonitorHandle) -> Result<FeedStats, MonitorError>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = FeedStats::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        stats.lines += 1;
        match parse_line(stats.lines, &line) {
            Ok(Some(observation)) => {
                monitor.observe(observation).await?;
                stats.forwarded += 1;
            }
            Ok(None) if is_filler(&line) => {}
            Ok(None) => {
                debug!(line = stats.lines, "Event without headers skipped");
                stats.skipped += 1;
            }
            Err(e) => {
                warn!(error = %e, "Skipping feed line");
                stats.skipped += 1;
            }
        }
    }

    debug!(
        lines = stats.lines,
        forwarded = stats.forwarded,
        skipped = stats.skipped,
        "Feed drained"
    );
    Ok(stats)
}
