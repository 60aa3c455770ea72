// MP4/M4A format support
//
// MP4 format uses "atoms" (boxes) to store metadata.
// iTunes-style metadata is stored in ilst atom under moov/udta/meta.
//
// MP4 File Structure:
// - ftyp: File type atom (brand + minor version)
// - moov: Movie atom (container)
//   - mvhd: Movie header (time scale, duration, rate, volume)
//   - trak/mdia/mdhd: Media header (per-track time scale and duration)
//   - udta: User data atom
//     - meta: Metadata atom (4 bytes version/flags before its children)
//       - ilst: Information list atom (one child per tag, each with a data atom)
// - mdat: Media data atom
//
// Reference:
// - ISO/IEC 14496-12: ISO Base Media File Format
// - https://developer.apple.com/library/archive/documentation/QuickTime/QTFF/Metadata/Metadata.html

pub mod atom;
pub mod cover;
pub mod stream;
pub mod tags;
pub mod walker;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::config::ParserConfig;
use crate::error::{Error, Result};
use crate::id3::{genre_name, GenreLookup};
use crate::metadata::AudioMetadata;
use crate::utils::io::ByteCursor;

use atom::AtomNode;
use cover::ImageCodec;
use tags::TagContext;
use walker::ContainerWalker;

/// Bytes 4..8 of an MP4 file.
pub const MP4_SIGNATURE: &[u8; 4] = b"ftyp";

/// MP4 atom types
pub mod atoms {
    use super::atom::FourCC;

    pub const FTYP: FourCC = FourCC::new(b"ftyp");
    pub const MOOV: FourCC = FourCC::new(b"moov");
    pub const MVHD: FourCC = FourCC::new(b"mvhd");
    pub const TRAK: FourCC = FourCC::new(b"trak");
    pub const MDIA: FourCC = FourCC::new(b"mdia");
    pub const MDHD: FourCC = FourCC::new(b"mdhd");
    pub const UDTA: FourCC = FourCC::new(b"udta");
    pub const META: FourCC = FourCC::new(b"meta");
    pub const ILST: FourCC = FourCC::new(b"ilst");
    pub const DATA: FourCC = FourCC::new(b"data");
}

/// Reads M4A metadata from a forward-only byte stream.
///
/// ```no_run
/// use m4a_info::M4aParser;
///
/// let file = std::fs::File::open("song.m4a")?;
/// let metadata = M4aParser::new().parse(std::io::BufReader::new(file))?;
/// println!("{:?}", metadata.title);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct M4aParser<'c> {
    config: ParserConfig,
    codec: Option<&'c dyn ImageCodec>,
    genres: GenreLookup,
}

impl Default for M4aParser<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'c> M4aParser<'c> {
    pub fn new() -> Self {
        M4aParser {
            config: ParserConfig::default(),
            codec: None,
            genres: genre_name,
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Decode `covr` items with `codec`; without one only the raw bytes are kept.
    pub fn with_image_codec(mut self, codec: &'c dyn ImageCodec) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Replace the ID3v1 table used for numeric `gnre` items.
    pub fn with_genre_lookup(mut self, genres: GenreLookup) -> Self {
        self.genres = genres;
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Walk the whole container.
    ///
    /// Any fault on the mandatory path comes back as `Error::ParseFailed`
    /// and no partial metadata is returned.
    pub fn parse<R: Read>(&self, reader: R) -> Result<AudioMetadata> {
        let mut cursor = ByteCursor::new(reader);
        let mut root = AtomNode::root(&mut cursor);
        let mut metadata = AudioMetadata::default();

        let ctx = TagContext {
            config: &self.config,
            codec: self.codec,
            genres: self.genres,
        };
        ContainerWalker::new(&mut metadata, ctx)
            .walk(&mut root)
            .map_err(Error::parse_failed)?;

        Ok(metadata)
    }

    /// Open `path` and parse it.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<AudioMetadata> {
        let file = File::open(path).map_err(|e| Error::Io(e).parse_failed())?;
        self.parse(BufReader::new(file))
    }
}

/// Top-level atoms of a file as (type, offset, length), stopping at the first fault.
pub fn list_top_level<R: Read>(reader: R) -> Vec<(String, u64, u64)> {
    let mut cursor = ByteCursor::new(reader);
    let mut root = AtomNode::root(&mut cursor);
    let mut atoms = Vec::new();
    while let Ok(child) = root.next_child() {
        atoms.push((
            child.kind().to_string(),
            child.offset(),
            child.position() - child.offset() + child.remaining(),
        ));
    }
    atoms
}
