// ID3 support shared with the MP4 reader
pub mod v1;

pub use v1::{genre_name, GenreLookup};
