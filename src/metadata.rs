// Audio metadata record produced by the MP4 reader

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Serialize, Serializer};

use crate::mp4::cover::Bitmap;

/// A two-part number from an mvhd rate or volume field.
///
/// The value is formed by writing the integer part and the fractional part
/// as decimal digits one after the other, so `1` and `0` give `10` and
/// `-1` and `5` give `-15`. This is not `integer + fraction / 2^n`; callers
/// comparing against other tools should use `integer()` and `fraction()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPoint {
    integer: i32,
    fraction: u32,
}

impl FixedPoint {
    pub fn new(integer: i32, fraction: u32) -> Self {
        FixedPoint { integer, fraction }
    }

    pub fn integer(&self) -> i32 {
        self.integer
    }

    pub fn fraction(&self) -> u32 {
        self.fraction
    }

    /// The concatenated decimal value.
    pub fn value(&self) -> i64 {
        // at most "-32768" followed by "65535", well inside i64
        self.to_string().parse().unwrap_or_default()
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.integer, self.fraction)
    }
}

impl Serialize for FixedPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.value())
    }
}

fn serialize_base64<S: Serializer>(data: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    match data {
        Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
        None => serializer.serialize_none(),
    }
}

/// Tags and stream properties read from an M4A file.
///
/// Unset fields stay `None`; nothing is defaulted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AudioMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disc: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discs: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouping: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compilation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    /// Playback volume, normally `10` (see [`FixedPoint`])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<FixedPoint>,
    /// Playback rate, normally `10` (see [`FixedPoint`])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<FixedPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tempo: Option<i16>,
    /// 0 none, 2 clean, 4 explicit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i8>,
    /// Decoded artwork, bounded by the configured cover size
    #[serde(skip)]
    pub cover: Option<Bitmap>,
    /// Thumbnail of `cover`
    #[serde(skip)]
    pub small_cover: Option<Bitmap>,
    /// Raw `covr` payload as stored in the file
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_base64"
    )]
    pub cover_data: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_mime: Option<&'static str>,
}

impl AudioMetadata {
    /// Record a duration unless one is already known. Zero counts as unknown.
    pub(crate) fn offer_duration(&mut self, source: &str, millis: u64) {
        match self.duration {
            None | Some(0) => self.duration = Some(millis),
            Some(current) if current.abs_diff(millis) > 2 => {
                log::debug!("{}: duration {} -> {}", source, current, millis);
            }
            Some(_) => {}
        }
    }

    /// Serialize to a JSON object, dropping the raw cover unless asked for.
    pub fn to_json(&self, with_cover: bool) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if !with_cover {
            if let Some(obj) = value.as_object_mut() {
                obj.remove("cover_data");
            }
        }
        value
    }
}

/// Write `value` into `slot` only while it is unset or blank.
pub(crate) fn set_if_blank(slot: &mut Option<String>, value: impl FnOnce() -> Option<String>) {
    let blank = slot.as_deref().map_or(true, |s| s.trim().is_empty());
    if blank {
        if let Some(v) = value() {
            *slot = Some(v);
        }
    }
}

/// Guess an image MIME type from its magic bytes.
pub fn sniff_image_mime(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("image/png")
    } else if data.starts_with(b"GIF8") {
        Some("image/gif")
    } else if data.starts_with(b"BM") {
        Some("image/bmp")
    } else {
        None
    }
}

/// File extension for a sniffed MIME type.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/bmp" => "bmp",
        _ => "bin",
    }
}
