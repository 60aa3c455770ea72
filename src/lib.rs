//! # m4a-info
//!
//! Reads iTunes-style tags (title, artist, album, cover art, track and disc
//! numbers, duration, ...) from MP4/M4A audio files by walking the atom tree
//! of a forward-only byte stream.
//!
//! ```no_run
//! use m4a_info::{read_from_path, M4aParser};
//!
//! let metadata = read_from_path("song.m4a", &M4aParser::new())?;
//! println!("{} - {}", metadata.artist.unwrap_or_default(), metadata.title.unwrap_or_default());
//! # Ok::<(), m4a_info::Error>(())
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

pub mod config;
pub mod error;
pub mod field_mapping;
pub mod id3;
pub mod metadata;
pub mod mp4;
pub mod utils;

pub use config::ParserConfig;
pub use error::{Error, ImageError, Result};
pub use field_mapping::{FieldMappings, StandardField};
pub use metadata::{AudioMetadata, FixedPoint};
pub use mp4::atom::{AtomHeader, AtomNode, FourCC};
pub use mp4::cover::{Bitmap, ImageCodec};
pub use mp4::M4aParser;
pub use utils::encoding::TextEncoding;

const ID3V2_SIGNATURE: &[u8; 3] = b"ID3";

/// Container format guessed from the first bytes of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// ISO base media (M4A, MP4, M4B, ...)
    Mp4,
    /// MP3 with a leading ID3v2 tag, handled by a different reader
    Id3v2,
    Unknown,
}

impl AudioFormat {
    /// Number of leading bytes `sniff` looks at
    pub const SNIFF_LEN: usize = 8;

    pub fn sniff(header: &[u8]) -> Self {
        if header.len() >= 8 && &header[4..8] == mp4::MP4_SIGNATURE {
            AudioFormat::Mp4
        } else if header.starts_with(ID3V2_SIGNATURE) {
            AudioFormat::Id3v2
        } else {
            AudioFormat::Unknown
        }
    }

    /// Sniff the format of a file on disk
    pub fn detect(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let mut file = File::open(path)?;
        let mut header = Vec::with_capacity(Self::SNIFF_LEN);
        file.by_ref()
            .take(Self::SNIFF_LEN as u64)
            .read_to_end(&mut header)?;
        Ok(Self::sniff(&header))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp4 => "MP4",
            AudioFormat::Id3v2 => "ID3v2",
            AudioFormat::Unknown => "unknown",
        }
    }
}

/// Parse the M4A file at `path`
pub fn read_from_path(path: impl AsRef<Path>, parser: &M4aParser<'_>) -> Result<AudioMetadata> {
    parser.parse_file(path)
}
