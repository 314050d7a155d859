//! Quality options offered to the user before downloading.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A user-selectable encoding, derived from the source's format list.
///
/// Computed per catalog query; never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormatOption {
    /// Source-tool format identifier (e.g. "137")
    pub format_id: String,
    /// Readable label, e.g. "1920x1080 (60fps)"
    pub quality_label: String,
    /// Resolution as reported by the source, "WxH"
    pub resolution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    /// Container extension
    pub ext: String,
    /// Estimated video-only size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    /// Estimated size in MiB, one decimal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize_mb: Option<f64>,
    /// `filesize + fps * 1_000_000`
    pub quality_score: f64,
    pub note: String,
}

impl FormatOption {
    /// Vertical resolution parsed from `"WxH"`.
    pub fn height(&self) -> Option<u32> {
        parse_height(&self.resolution)
    }
}

/// Parse the height component of a `"WxH"` resolution string.
pub fn parse_height(resolution: &str) -> Option<u32> {
    let (_, height) = resolution.split_once('x')?;
    height.trim().parse().ok()
}
