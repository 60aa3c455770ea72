// Metadata field mapping
//
// Maps iTunes item atoms (the children of `ilst`) to the metadata field they
// fill, and gives every field a stable lowercase name for output filtering.
//
// Several fields have more than one atom code:
// - composer: ©com, ©wrt
// - copyright: cprt, ©cpy
// - genre: gnre (ID3v1 index or text), ©gen (text)

use crate::mp4::atom::FourCC;

/// Metadata fields, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardField {
    Brand,
    Version,
    Duration,
    Title,
    Artist,
    AlbumArtist,
    Album,
    Year,
    Genre,
    Comment,
    Track,
    Tracks,
    Disc,
    Discs,
    Copyright,
    Composer,
    Grouping,
    Compilation,
    Lyrics,
    Volume,
    Speed,
    Tempo,
    Rating,
    Cover,
}

impl StandardField {
    pub const ALL: [StandardField; 24] = [
        StandardField::Brand,
        StandardField::Version,
        StandardField::Duration,
        StandardField::Title,
        StandardField::Artist,
        StandardField::AlbumArtist,
        StandardField::Album,
        StandardField::Year,
        StandardField::Genre,
        StandardField::Comment,
        StandardField::Track,
        StandardField::Tracks,
        StandardField::Disc,
        StandardField::Discs,
        StandardField::Copyright,
        StandardField::Composer,
        StandardField::Grouping,
        StandardField::Compilation,
        StandardField::Lyrics,
        StandardField::Volume,
        StandardField::Speed,
        StandardField::Tempo,
        StandardField::Rating,
        StandardField::Cover,
    ];

    /// Field name as used in JSON output
    pub fn as_str(&self) -> &'static str {
        match self {
            StandardField::Brand => "brand",
            StandardField::Version => "version",
            StandardField::Duration => "duration",
            StandardField::Title => "title",
            StandardField::Artist => "artist",
            StandardField::AlbumArtist => "album_artist",
            StandardField::Album => "album",
            StandardField::Year => "year",
            StandardField::Genre => "genre",
            StandardField::Comment => "comment",
            StandardField::Track => "track",
            StandardField::Tracks => "tracks",
            StandardField::Disc => "disc",
            StandardField::Discs => "discs",
            StandardField::Copyright => "copyright",
            StandardField::Composer => "composer",
            StandardField::Grouping => "grouping",
            StandardField::Compilation => "compilation",
            StandardField::Lyrics => "lyrics",
            StandardField::Volume => "volume",
            StandardField::Speed => "speed",
            StandardField::Tempo => "tempo",
            StandardField::Rating => "rating",
            StandardField::Cover => "cover_data",
        }
    }

    /// Parse from string, accepting `-` for `_` and any case
    pub fn from_str(s: &str) -> Option<Self> {
        let name = s.trim().to_lowercase().replace('-', "_");
        let name = match name.as_str() {
            "cover" => "cover_data",
            "albumartist" => "album_artist",
            other => other,
        }
        .to_string();
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }
}

/// How an `ilst` item's `data` payload is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItunesItem {
    /// Plain text written unconditionally
    Text(StandardField),
    /// Text written only while the field is still blank
    TextFirstWins(StandardField),
    /// ID3v1 genre index (2-byte payload) or text
    GenreIndex,
    /// `©day`: leading four digits are the year
    Year,
    /// Two padding bytes, then number and total
    Pair(StandardField, StandardField),
    Compilation,
    Rating,
    Tempo,
    Cover,
}

/// Format-specific field mappings
pub struct FieldMappings;

impl FieldMappings {
    pub const MP4_ALBUM: FourCC = FourCC::new(b"\xA9alb"); // ©alb
    pub const MP4_ALBUM_ARTIST: FourCC = FourCC::new(b"aART");
    pub const MP4_ARTIST: FourCC = FourCC::new(b"\xA9ART"); // ©ART
    pub const MP4_COMMENT: FourCC = FourCC::new(b"\xA9cmt"); // ©cmt
    pub const MP4_COMPOSER: FourCC = FourCC::new(b"\xA9com"); // ©com
    pub const MP4_WRITER: FourCC = FourCC::new(b"\xA9wrt"); // ©wrt
    pub const MP4_COVER: FourCC = FourCC::new(b"covr");
    pub const MP4_COMPILATION: FourCC = FourCC::new(b"cpil");
    pub const MP4_COPYRIGHT: FourCC = FourCC::new(b"cprt");
    pub const MP4_COPYRIGHT_ALT: FourCC = FourCC::new(b"\xA9cpy"); // ©cpy
    pub const MP4_YEAR: FourCC = FourCC::new(b"\xA9day"); // ©day
    pub const MP4_DISC: FourCC = FourCC::new(b"disk");
    pub const MP4_GENRE_INDEX: FourCC = FourCC::new(b"gnre");
    pub const MP4_GENRE: FourCC = FourCC::new(b"\xA9gen"); // ©gen
    pub const MP4_GROUPING: FourCC = FourCC::new(b"\xA9grp"); // ©grp
    pub const MP4_LYRICS: FourCC = FourCC::new(b"\xA9lyr"); // ©lyr
    pub const MP4_TITLE: FourCC = FourCC::new(b"\xA9nam"); // ©nam
    pub const MP4_RATING: FourCC = FourCC::new(b"rtng");
    pub const MP4_TEMPO: FourCC = FourCC::new(b"tmpo");
    pub const MP4_TRACK: FourCC = FourCC::new(b"trkn");

    /// Decoder for an `ilst` item atom, `None` for items this reader ignores
    pub fn from_mp4(code: FourCC) -> Option<ItunesItem> {
        let item = match code {
            Self::MP4_ALBUM => ItunesItem::Text(StandardField::Album),
            Self::MP4_ALBUM_ARTIST => ItunesItem::Text(StandardField::AlbumArtist),
            Self::MP4_ARTIST => ItunesItem::Text(StandardField::Artist),
            Self::MP4_COMMENT => ItunesItem::Text(StandardField::Comment),
            Self::MP4_GROUPING => ItunesItem::Text(StandardField::Grouping),
            Self::MP4_LYRICS => ItunesItem::Text(StandardField::Lyrics),
            Self::MP4_TITLE => ItunesItem::Text(StandardField::Title),
            Self::MP4_COMPOSER | Self::MP4_WRITER => {
                ItunesItem::TextFirstWins(StandardField::Composer)
            }
            Self::MP4_COPYRIGHT | Self::MP4_COPYRIGHT_ALT => {
                ItunesItem::TextFirstWins(StandardField::Copyright)
            }
            Self::MP4_GENRE => ItunesItem::TextFirstWins(StandardField::Genre),
            Self::MP4_GENRE_INDEX => ItunesItem::GenreIndex,
            Self::MP4_YEAR => ItunesItem::Year,
            Self::MP4_TRACK => ItunesItem::Pair(StandardField::Track, StandardField::Tracks),
            Self::MP4_DISC => ItunesItem::Pair(StandardField::Disc, StandardField::Discs),
            Self::MP4_COMPILATION => ItunesItem::Compilation,
            Self::MP4_RATING => ItunesItem::Rating,
            Self::MP4_TEMPO => ItunesItem::Tempo,
            Self::MP4_COVER => ItunesItem::Cover,
            _ => return None,
        };
        Some(item)
    }

    /// Parse a comma-separated field list, reporting unknown names
    pub fn parse_field_list(list: &str) -> Result<Vec<StandardField>, String> {
        list.split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| StandardField::from_str(s).ok_or_else(|| format!("unknown field: {}", s.trim())))
            .collect()
    }
}
