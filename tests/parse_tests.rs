//! End-to-end parsing of synthetic M4A streams.

mod common;

use std::fs;
use std::io::Cursor;

use common::builder::*;
use m4a_info::{
    read_from_path, AudioFormat, Bitmap, Error, ImageCodec, ImageError, M4aParser, ParserConfig,
    TextEncoding,
};

fn parse(data: Vec<u8>) -> Result<m4a_info::AudioMetadata, Error> {
    let _ = env_logger::builder().is_test(true).try_init();
    M4aParser::new().parse(Cursor::new(data))
}

#[test]
fn test_title_and_brand() {
    let file = m4a(&[mvhd(1000, 5000), udta(&[item(b"\xA9nam", b"Title")])]);
    let metadata = parse(file).unwrap();

    assert_eq!(metadata.brand.as_deref(), Some("M4A"));
    assert_eq!(metadata.version, Some(0x200));
    assert_eq!(metadata.title.as_deref(), Some("Title"));
    assert_eq!(metadata.duration, Some(5000));
}

#[test]
fn test_movie_duration_wins_over_track() {
    let file = m4a(&[mvhd(1000, 10000), trak(44100, 440_956)]);
    let metadata = parse(file).unwrap();
    assert_eq!(metadata.duration, Some(10000));
}

#[test]
fn test_track_duration_when_movie_comes_later() {
    let file = m4a(&[trak(44100, 441_000), mvhd(1000, 12345)]);
    let metadata = parse(file).unwrap();
    assert_eq!(metadata.duration, Some(10000));
}

#[test]
fn test_zero_movie_duration_falls_back_to_track() {
    let file = m4a(&[mvhd(1000, 0), trak(44100, 441_000)]);
    let metadata = parse(file).unwrap();
    assert_eq!(metadata.duration, Some(10000));
}

#[test]
fn test_version_1_movie_header() {
    let file = m4a(&[mvhd_v1(600, 600 * 3600 * 5)]);
    let metadata = parse(file).unwrap();
    assert_eq!(metadata.duration, Some(5 * 3600 * 1000));
}

#[test]
fn test_zero_time_scale_leaves_duration_unset() {
    let file = m4a(&[mvhd(0, 1000)]);
    let metadata = parse(file).unwrap();
    assert_eq!(metadata.duration, None);
}

#[test]
fn test_speed_and_volume() {
    let metadata = parse(m4a(&[mvhd(1000, 1)])).unwrap();
    assert_eq!(metadata.speed.map(|s| s.value()), Some(10));
    assert_eq!(metadata.volume.map(|v| v.value()), Some(10));
    assert_eq!(metadata.speed.map(|s| (s.integer(), s.fraction())), Some((1, 0)));
}

#[test]
fn test_genre_index() {
    let file = m4a(&[mvhd(1000, 1), udta(&[item(b"gnre", &[0x00, 0x01])])]);
    let metadata = parse(file).unwrap();
    assert_eq!(metadata.genre.as_deref(), Some("Blues"));
}

#[test]
fn test_track_numbers() {
    let file = m4a(&[
        mvhd(1000, 1),
        udta(&[
            item(b"trkn", &[0, 0, 0, 5, 0, 12]),
            item(b"disk", &[0, 0, 0, 2, 0, 3]),
        ]),
    ]);
    let metadata = parse(file).unwrap();
    assert_eq!(metadata.track, Some(5));
    assert_eq!(metadata.tracks, Some(12));
    assert_eq!(metadata.disc, Some(2));
    assert_eq!(metadata.discs, Some(3));
}

#[test]
fn test_full_tag_set() {
    let file = m4a(&[
        mvhd(1000, 1),
        trak(48000, 48000),
        udta(&[
            item(b"\xA9nam", b"Title"),
            item(b"\xA9ART", b"Artist"),
            item(b"aART", b"Album Artist"),
            item(b"\xA9alb", b"Album"),
            item(b"\xA9day", b"1999-12-31"),
            item(b"\xA9gen", b"Electronic"),
            item(b"\xA9cmt", b"Comment"),
            item(b"\xA9grp", b"Grouping"),
            item(b"\xA9lyr", b"La la la"),
            item(b"cprt", b"(c) Label"),
            item(b"\xA9cpy", b"(c) Other"),
            item(b"\xA9wrt", b"Writer"),
            item(b"\xA9com", b"Composer"),
            item(b"cpil", &[1]),
            item(b"tmpo", &[0, 128]),
            item(b"rtng", &[2]),
        ]),
    ]);
    let metadata = parse(file).unwrap();

    assert_eq!(metadata.title.as_deref(), Some("Title"));
    assert_eq!(metadata.artist.as_deref(), Some("Artist"));
    assert_eq!(metadata.album_artist.as_deref(), Some("Album Artist"));
    assert_eq!(metadata.album.as_deref(), Some("Album"));
    assert_eq!(metadata.year, Some(1999));
    assert_eq!(metadata.genre.as_deref(), Some("Electronic"));
    assert_eq!(metadata.comment.as_deref(), Some("Comment"));
    assert_eq!(metadata.grouping.as_deref(), Some("Grouping"));
    assert_eq!(metadata.lyrics.as_deref(), Some("La la la"));
    assert_eq!(metadata.copyright.as_deref(), Some("(c) Label"));
    assert_eq!(metadata.composer.as_deref(), Some("Writer"));
    assert_eq!(metadata.compilation, Some(true));
    assert_eq!(metadata.tempo, Some(128));
    assert_eq!(metadata.rating, Some(2));
}

#[test]
fn test_bad_item_does_not_stop_the_rest() {
    let file = m4a(&[
        mvhd(1000, 1),
        udta(&[
            item(b"\xA9day", b"soon"),
            item(b"trkn", &[0]),
            atom(b"\xA9cmt", &[]),
            item(b"\xA9nam", b"Still here"),
        ]),
    ]);
    let metadata = parse(file).unwrap();
    assert_eq!(metadata.year, None);
    assert_eq!(metadata.track, None);
    assert_eq!(metadata.comment, None);
    assert_eq!(metadata.title.as_deref(), Some("Still here"));
}

#[test]
fn test_oversized_data_atom_is_skipped() {
    // data claims 1 TiB inside a correctly sized covr item
    let mut data = 1u32.to_be_bytes().to_vec();
    data.extend_from_slice(b"data");
    data.extend_from_slice(&(1u64 << 40).to_be_bytes());
    data.extend_from_slice(&[0, 0, 0, 13, 0, 0, 0, 0, 0xFF, 0xD8, 0xFF]);

    let file = m4a(&[
        mvhd(1000, 1),
        udta(&[atom(b"covr", &data), item(b"\xA9nam", b"After")]),
    ]);
    let metadata = parse(file).unwrap();
    assert!(metadata.cover_data.is_none());
    assert_eq!(metadata.title.as_deref(), Some("After"));
}

#[test]
fn test_oversized_item_fails_the_parse() {
    let mut covr = 1u32.to_be_bytes().to_vec();
    covr.extend_from_slice(b"covr");
    covr.extend_from_slice(&(1u64 << 40).to_be_bytes());
    covr.extend_from_slice(&[0; 16]);

    let err = parse(m4a(&[mvhd(1000, 1), udta(&[covr])])).unwrap_err();
    assert!(matches!(err.root_cause(), Error::MalformedAtom { .. }), "{}", err);
}

#[test]
fn test_truncated_file_yields_no_metadata() {
    let mut file = m4a(&[mvhd(1000, 1), udta(&[item(b"\xA9nam", b"Title")])]);
    file.truncate(file.len() - 60);

    match parse(file) {
        Err(Error::ParseFailed(inner)) => {
            assert!(matches!(*inner, Error::TruncatedAtom { .. }), "{}", inner)
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(metadata) => panic!("partial metadata returned: {:?}", metadata),
    }
}

#[test]
fn test_missing_moov() {
    let mut file = ftyp(b"M4A ", 0);
    file.extend(atom(b"free", &[0; 8]));
    file.extend(atom(b"mdat", &[0; 8]));

    let err = parse(file).unwrap_err();
    assert!(matches!(err.root_cause(), Error::AtomNotFound { .. }), "{}", err);
}

#[test]
fn test_file_must_start_with_ftyp() {
    let file = container(b"moov", &[mvhd(1000, 1)]);
    let err = parse(file).unwrap_err();
    assert!(matches!(err.root_cause(), Error::AtomTypeMismatch { .. }), "{}", err);
}

#[test]
fn test_malformed_length_fails() {
    let mut file = ftyp(b"M4A ", 0);
    file.extend_from_slice(&[0, 0, 0, 3]);
    file.extend_from_slice(b"moov");

    let err = parse(file).unwrap_err();
    assert!(matches!(err.root_cause(), Error::MalformedAtom { length: 3, .. }), "{}", err);
}

#[test]
fn test_unexpected_brand_is_only_a_warning() {
    let mut file = ftyp(b"XXXX", 1);
    file.extend(container(b"moov", &[mvhd(1000, 2000)]));
    let metadata = parse(file).unwrap();
    assert_eq!(metadata.brand.as_deref(), Some("XXXX"));
    assert_eq!(metadata.duration, Some(2000));
}

#[test]
fn test_extended_size_atoms_before_moov() {
    let mut file = ftyp(b"M4A ", 0);
    file.extend(extended_atom(b"mdat", &[0xEE; 40]));
    file.extend(container(b"moov", &[mvhd(1000, 750), udta(&[item(b"\xA9nam", b"Late")])]));

    let metadata = parse(file).unwrap();
    assert_eq!(metadata.duration, Some(750));
    assert_eq!(metadata.title.as_deref(), Some("Late"));
}

#[test]
fn test_latin1_tags() {
    let file = m4a(&[mvhd(1000, 1), udta(&[item(b"\xA9ART", b"Bj\xF6rk")])]);
    let config = ParserConfig {
        text_encoding: TextEncoding::Latin1,
        ..Default::default()
    };
    let metadata = M4aParser::new()
        .with_config(config)
        .parse(Cursor::new(file))
        .unwrap();
    assert_eq!(metadata.artist.as_deref(), Some("Björk"));
}

#[test]
fn test_custom_genre_table() {
    fn genres(index: i32) -> Option<&'static str> {
        (index == 0).then_some("Custom")
    }
    let file = m4a(&[mvhd(1000, 1), udta(&[item(b"gnre", &[0x00, 0x01])])]);
    let metadata = M4aParser::new()
        .with_genre_lookup(genres)
        .parse(Cursor::new(file))
        .unwrap();
    assert_eq!(metadata.genre.as_deref(), Some("Custom"));
}

/// Reads the image size from the first 8 bytes and fakes the pixels.
struct SizeCodec;

impl SizeCodec {
    fn bounds(data: &[u8]) -> Result<(u32, u32), ImageError> {
        match data {
            [a, b, c, d, e, f, g, h, ..] => Ok((
                u32::from_be_bytes([*a, *b, *c, *d]),
                u32::from_be_bytes([*e, *f, *g, *h]),
            )),
            _ => Err(ImageError("not an image".to_string())),
        }
    }
}

impl ImageCodec for SizeCodec {
    fn decode_bounds(&self, data: &[u8]) -> Result<(u32, u32), ImageError> {
        Self::bounds(data)
    }

    fn decode(&self, data: &[u8], sample_size: u32) -> Result<Bitmap, ImageError> {
        let (width, height) = Self::bounds(data)?;
        Ok(Bitmap {
            width: width / sample_size,
            height: height / sample_size,
            pixels: vec![0; 4],
        })
    }

    fn scale(&self, _image: &Bitmap, width: u32, height: u32) -> Result<Bitmap, ImageError> {
        Ok(Bitmap {
            width,
            height,
            pixels: vec![0; 1],
        })
    }
}

#[test]
fn test_cover_art() {
    let mut image = 1920u32.to_be_bytes().to_vec();
    image.extend_from_slice(&1440u32.to_be_bytes());
    let file = m4a(&[mvhd(1000, 1), udta(&[item(b"covr", &image)])]);

    let codec = SizeCodec;
    let metadata = M4aParser::new()
        .with_image_codec(&codec)
        .parse(Cursor::new(file))
        .unwrap();

    let cover = metadata.cover.as_ref().unwrap();
    assert_eq!((cover.width, cover.height), (480, 360));
    let small = metadata.small_cover.as_ref().unwrap();
    assert_eq!((small.width, small.height), (120, 90));
    assert_eq!(metadata.cover_data.as_deref(), Some(&image[..]));
}

#[test]
fn test_undecodable_cover_keeps_raw_bytes() {
    let file = m4a(&[
        mvhd(1000, 1),
        udta(&[item(b"covr", &[1, 2, 3]), item(b"\xA9nam", b"Title")]),
    ]);
    let codec = SizeCodec;
    let metadata = M4aParser::new()
        .with_image_codec(&codec)
        .parse(Cursor::new(file))
        .unwrap();

    assert!(metadata.cover.is_none());
    assert_eq!(metadata.cover_data, Some(vec![1, 2, 3]));
    assert_eq!(metadata.title.as_deref(), Some("Title"));
}

#[test]
fn test_read_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.m4a");
    fs::write(
        &path,
        m4a(&[mvhd(1000, 3000), udta(&[item(b"\xA9nam", b"From disk")])]),
    )
    .unwrap();

    assert_eq!(AudioFormat::detect(&path).unwrap(), AudioFormat::Mp4);
    let metadata = read_from_path(&path, &M4aParser::new()).unwrap();
    assert_eq!(metadata.title.as_deref(), Some("From disk"));
    assert_eq!(metadata.duration, Some(3000));

    let json = metadata.to_json(false);
    assert_eq!(json["title"], "From disk");
    assert!(json.get("cover_data").is_none());
}

#[test]
fn test_missing_file() {
    let err = read_from_path("/nonexistent/song.m4a", &M4aParser::new()).unwrap_err();
    assert!(matches!(err.root_cause(), Error::Io(_)));
}
