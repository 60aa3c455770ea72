// iTunes item decoding
//
// Each child of `ilst` is named after the tag it carries and holds a `data`
// atom: 4 bytes version/flags, 4 reserved bytes, then the value.

use crate::config::ParserConfig;
use crate::error::Result;
use crate::field_mapping::{FieldMappings, ItunesItem, StandardField};
use crate::id3::GenreLookup;
use crate::metadata::{set_if_blank, sniff_image_mime, AudioMetadata};
use crate::mp4::atom::{AtomNode, FourCC};
use crate::mp4::cover::{decode_cover, ImageCodec};
use crate::utils::io::ByteSource;

/// Everything a tag decoder needs besides the atom and the record.
pub struct TagContext<'c> {
    pub config: &'c ParserConfig,
    pub codec: Option<&'c dyn ImageCodec>,
    pub genres: GenreLookup,
}

fn text_slot(metadata: &mut AudioMetadata, field: StandardField) -> Option<&mut Option<String>> {
    match field {
        StandardField::Album => Some(&mut metadata.album),
        StandardField::AlbumArtist => Some(&mut metadata.album_artist),
        StandardField::Artist => Some(&mut metadata.artist),
        StandardField::Comment => Some(&mut metadata.comment),
        StandardField::Composer => Some(&mut metadata.composer),
        StandardField::Copyright => Some(&mut metadata.copyright),
        StandardField::Genre => Some(&mut metadata.genre),
        StandardField::Grouping => Some(&mut metadata.grouping),
        StandardField::Lyrics => Some(&mut metadata.lyrics),
        StandardField::Title => Some(&mut metadata.title),
        _ => None,
    }
}

fn number_slot(metadata: &mut AudioMetadata, field: StandardField) -> Option<&mut Option<i16>> {
    match field {
        StandardField::Track => Some(&mut metadata.track),
        StandardField::Tracks => Some(&mut metadata.tracks),
        StandardField::Disc => Some(&mut metadata.disc),
        StandardField::Discs => Some(&mut metadata.discs),
        _ => None,
    }
}

/// Decode one `data` atom into `metadata`, keyed on the enclosing item type.
pub fn decode_data(
    data: &mut AtomNode<'_>,
    item: FourCC,
    metadata: &mut AudioMetadata,
    ctx: &TagContext<'_>,
) -> Result<()> {
    log::trace!("{}", data);

    data.skip(4)?; // version & flags
    data.skip(4)?; // reserved

    let kind = match FieldMappings::from_mp4(item) {
        Some(kind) => kind,
        None => {
            log::trace!("{}: ignored", data.path());
            return Ok(());
        }
    };
    let encoding = ctx.config.text_encoding;

    match kind {
        ItunesItem::Text(field) => {
            let value = data.read_remaining_string(encoding)?;
            if let Some(slot) = text_slot(metadata, field) {
                *slot = Some(value);
            }
        }
        ItunesItem::TextFirstWins(field) => {
            if let Some(slot) = text_slot(metadata, field) {
                let value = data.read_remaining_string(encoding)?;
                set_if_blank(slot, || Some(value));
            }
        }
        ItunesItem::GenreIndex => {
            let blank = metadata
                .genre
                .as_deref()
                .map_or(true, |g| g.trim().is_empty());
            if blank {
                if data.remaining() == 2 {
                    let index = data.read_i16()? as i32 - 1;
                    match (ctx.genres)(index) {
                        Some(name) => metadata.genre = Some(name.to_string()),
                        None => log::debug!("{}: unknown genre index {}", data.path(), index),
                    }
                } else {
                    metadata.genre = Some(data.read_remaining_string(encoding)?);
                }
            }
        }
        ItunesItem::Year => {
            let day = data.read_remaining_string(encoding)?;
            let day = day.trim();
            if day.chars().count() >= 4 {
                let prefix: String = day.chars().take(4).collect();
                match prefix.parse::<i16>() {
                    Ok(year) => metadata.year = Some(year),
                    Err(_) => log::debug!("{}: ignoring malformed year {:?}", data.path(), day),
                }
            }
        }
        ItunesItem::Pair(number, total) => {
            data.skip(2)?; // padding
            let n = data.read_i16()?;
            let t = data.read_i16()?;
            if let Some(slot) = number_slot(metadata, number) {
                *slot = Some(n);
            }
            if let Some(slot) = number_slot(metadata, total) {
                *slot = Some(t);
            }
        }
        ItunesItem::Compilation => {
            metadata.compilation = Some(data.read_bool()?);
        }
        ItunesItem::Rating => {
            metadata.rating = Some(data.read_i8()?);
        }
        ItunesItem::Tempo => {
            metadata.tempo = Some(data.read_i16()?);
        }
        ItunesItem::Cover => {
            let bytes = data.read_remaining_bytes()?;
            decode_cover_item(data.path(), bytes, metadata, ctx);
        }
    }

    Ok(())
}

fn decode_cover_item(
    path: &str,
    bytes: Vec<u8>,
    metadata: &mut AudioMetadata,
    ctx: &TagContext<'_>,
) {
    if let (Some(codec), true) = (ctx.codec, ctx.config.decode_cover) {
        match decode_cover(
            codec,
            &bytes,
            ctx.config.cover_max_size,
            ctx.config.thumbnail_size,
        ) {
            Ok((cover, small)) => {
                metadata.cover = Some(cover);
                metadata.small_cover = Some(small);
            }
            Err(e) => log::warn!("{}: {}", path, e),
        }
    }

    metadata.cover_mime = sniff_image_mime(&bytes);
    metadata.cover_data = Some(bytes);
}
