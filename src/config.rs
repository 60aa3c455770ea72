// Parser configuration

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::utils::encoding::TextEncoding;

/// Tunables for [`M4aParser`](crate::mp4::M4aParser).
///
/// Can be loaded from JSON; missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Longest edge of the decoded cover before subsampling kicks in
    pub cover_max_size: u32,
    /// Longest edge of the cover thumbnail
    pub thumbnail_size: u32,
    /// Encoding of tag strings
    pub text_encoding: TextEncoding,
    /// Run the image codec on `covr` items
    pub decode_cover: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            cover_max_size: 800,
            thumbnail_size: 120,
            text_encoding: TextEncoding::Utf8,
            decode_cover: true,
        }
    }
}

impl ParserConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = Self::from_json(&json)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }
}
