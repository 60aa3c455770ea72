// Encoding utilities

use std::borrow::Cow;

use encoding_rs::UTF_8;
use serde::Deserialize;

/// Text encodings used by MP4 string fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    /// One byte per character; used for fourCC codes and the ftyp brand
    Latin1,
    #[default]
    Utf8,
}

/// Decode text with specified encoding, cutting it at the first NUL
pub fn decode_text(data: &[u8], encoding: TextEncoding) -> String {
    let text = match encoding {
        // ISO-8859-1: every byte is the code point of the same value
        TextEncoding::Latin1 => Cow::Owned(data.iter().map(|&b| b as char).collect()),
        TextEncoding::Utf8 => UTF_8.decode_without_bom_handling(data).0,
    };

    match text.find('\0') {
        Some(end) => text[..end].to_string(),
        None => text.into_owned(),
    }
}
