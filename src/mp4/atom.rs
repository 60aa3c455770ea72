// Atom (box) nodes
//
// An atom is `size:u32 type:[u8;4] [largesize:u64] payload`. Each AtomNode
// owns a BoundedSubstream scoped to exactly its payload; a child's stream is
// layered on its parent's, so a read can never leave the enclosing atom.

use std::fmt;

use crate::error::{Error, Result};
use crate::metadata::FixedPoint;
use crate::mp4::stream::BoundedSubstream;
use crate::utils::encoding::{decode_text, TextEncoding};
use crate::utils::io::ByteSource;

const HEADER_SIZE: u64 = 8;
const EXTENDED_HEADER_SIZE: u64 = 16;

/// A four character atom type code.
///
/// The bytes are single-byte characters (`©` is 0xA9), not UTF-8.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const fn new(code: &[u8; 4]) -> Self {
        FourCC(*code)
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Latin-1 maps each byte to the code point of the same value
        for &b in &self.0 {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({})", self)
    }
}

impl PartialEq<&[u8; 4]> for FourCC {
    fn eq(&self, other: &&[u8; 4]) -> bool {
        &self.0 == *other
    }
}

/// A parsed atom header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomHeader {
    pub kind: FourCC,
    /// Total atom length including the header.
    pub length: u64,
    /// 8, or 16 when the 64-bit extended size is present.
    pub header_size: u64,
}

impl AtomHeader {
    /// Read a header from `source`, validating the declared length.
    ///
    /// `parent_path` is only used to name the atom in errors.
    pub fn read(source: &mut dyn ByteSource, parent_path: &str) -> Result<Self> {
        let size = source.read_u32()?;
        let mut code = [0u8; 4];
        source.read_exact(&mut code)?;
        let kind = FourCC(code);

        let (length, header_size) = if size == 1 {
            (source.read_u64()?, EXTENDED_HEADER_SIZE)
        } else {
            (size as u64, HEADER_SIZE)
        };

        if length < header_size {
            return Err(Error::MalformedAtom {
                path: join_path(parent_path, kind),
                length,
            });
        }

        Ok(AtomHeader {
            kind,
            length,
            header_size,
        })
    }

    pub fn payload_length(&self) -> u64 {
        self.length - self.header_size
    }
}

fn join_path(parent: &str, kind: FourCC) -> String {
    if parent.is_empty() {
        kind.to_string()
    } else {
        format!("{}/{}", parent, kind)
    }
}

fn describe(expected: &[FourCC]) -> String {
    expected
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join("|")
}

/// One atom of the tree, positioned somewhere inside its payload.
///
/// Children borrow their parent's stream, so at most one child is alive at a
/// time. The parent remembers where its latest child ends and drains up to
/// that point before reading the next sibling header, which keeps it in sync
/// no matter how much of the child the caller consumed.
pub struct AtomNode<'a> {
    kind: FourCC,
    parent_kind: Option<FourCC>,
    path: String,
    offset: u64,
    stream: BoundedSubstream<'a>,
    child_end: Option<u64>,
}

impl<'a> AtomNode<'a> {
    /// The implicit root atom spanning the whole source.
    pub fn root(source: &'a mut (dyn ByteSource + 'a)) -> Self {
        let offset = source.position();
        AtomNode {
            kind: FourCC([0; 4]),
            parent_kind: None,
            path: String::new(),
            offset,
            stream: BoundedSubstream::unbounded(source),
            child_end: None,
        }
    }

    pub fn kind(&self) -> FourCC {
        self.kind
    }

    /// Type of the enclosing atom, `None` for the root and top-level atoms.
    pub fn parent_kind(&self) -> Option<FourCC> {
        self.parent_kind
    }

    /// Slash separated path from the root, e.g. `moov/udta/meta`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Absolute offset of the first byte of this atom's header.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Absolute position of the next unread payload byte.
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    /// Payload bytes not yet consumed, including any undrained child.
    pub fn remaining(&self) -> u64 {
        self.stream.bytes_left()
    }

    fn pending_child(&self) -> u64 {
        self.child_end
            .map(|end| end.saturating_sub(self.stream.consumed()))
            .unwrap_or(0)
    }

    /// True while payload bytes remain beyond the latest child.
    pub fn has_more_children(&self) -> bool {
        self.remaining() > self.pending_child()
    }

    /// Drain whatever the caller left unread of the latest child.
    fn settle(&mut self) -> Result<()> {
        let pending = self.pending_child();
        self.child_end = None;
        if pending > 0 {
            self.stream.skip(pending).map_err(|e| e.at(&self.path))?;
        }
        Ok(())
    }

    /// Settle the previous child and read the next sibling header.
    fn advance(&mut self) -> Result<AtomHeader> {
        self.settle()?;
        let header =
            AtomHeader::read(&mut self.stream, &self.path).map_err(|e| e.at(&self.path))?;
        if self.stream.is_bounded() && header.payload_length() > self.stream.bytes_left() {
            return Err(Error::MalformedAtom {
                path: join_path(&self.path, header.kind),
                length: header.length,
            });
        }
        self.child_end = Some(
            self.stream
                .consumed()
                .saturating_add(header.payload_length()),
        );
        Ok(header)
    }

    fn open(&mut self, header: AtomHeader) -> AtomNode<'_> {
        let offset = self.stream.position() - header.header_size;
        let parent_kind = if self.path.is_empty() {
            None
        } else {
            Some(self.kind)
        };
        AtomNode {
            kind: header.kind,
            parent_kind,
            path: join_path(&self.path, header.kind),
            offset,
            stream: BoundedSubstream::new(&mut self.stream, header.payload_length()),
            child_end: None,
        }
    }

    /// Produce the next child atom.
    pub fn next_child(&mut self) -> Result<AtomNode<'_>> {
        let header = self.advance()?;
        Ok(self.open(header))
    }

    /// Produce the next child, requiring it to be one of `expected`.
    pub fn next_child_of(&mut self, expected: &[FourCC]) -> Result<AtomNode<'_>> {
        let header = self.advance()?;
        if !expected.contains(&header.kind) {
            return Err(Error::AtomTypeMismatch {
                path: self.path.clone(),
                expected: describe(expected),
                actual: header.kind.to_string(),
            });
        }
        Ok(self.open(header))
    }

    /// Skip children until one of `expected` turns up.
    ///
    /// Fails with `AtomNotFound` once this atom's payload is exhausted.
    pub fn next_child_up_to(&mut self, expected: &[FourCC]) -> Result<AtomNode<'_>> {
        loop {
            if !self.has_more_children() {
                return Err(Error::AtomNotFound {
                    path: self.path.clone(),
                    expected: describe(expected),
                });
            }
            self.settle()?;
            let header = match self.advance() {
                Ok(header) => header,
                // the root has no declared end; a clean EOF between atoms ends it
                Err(Error::TruncatedAtom { available: 0, .. }) if !self.stream.is_bounded() => {
                    return Err(Error::AtomNotFound {
                        path: self.path.clone(),
                        expected: describe(expected),
                    });
                }
                Err(e) => return Err(e),
            };
            if expected.contains(&header.kind) {
                return Ok(self.open(header));
            }
            log::trace!("{}: skipping {}", self.path, header.kind);
        }
    }

    /// Like `next_child_up_to`, but absence is an ordinary outcome.
    pub fn find_child(&mut self, expected: &[FourCC]) -> Result<Option<AtomNode<'_>>> {
        loop {
            if !self.has_more_children() {
                return Ok(None);
            }
            let header = self.advance()?;
            if expected.contains(&header.kind) {
                return Ok(Some(self.open(header)));
            }
            log::trace!("{}: skipping {}", self.path, header.kind);
        }
    }

    /// Drain the rest of this atom's payload.
    pub fn skip_all(&mut self) -> Result<()> {
        self.child_end = None;
        self.stream.skip_all().map_err(|e| e.at(&self.path))
    }

    /// All bytes left in the payload.
    pub fn read_remaining_bytes(&mut self) -> Result<Vec<u8>> {
        self.settle()?;
        let len = usize::try_from(self.remaining()).map_err(|_| Error::MalformedAtom {
            path: self.path.clone(),
            length: self.stream.length(),
        })?;
        self.read_bytes(len)
    }

    /// Integer part from a signed byte, fraction from an unsigned byte.
    pub fn read_short_fixed_point(&mut self) -> Result<FixedPoint> {
        let integer = self.read_i8()?;
        let fraction = self.read_u8()?;
        Ok(FixedPoint::new(integer as i32, fraction as u32))
    }

    /// Integer part from a signed short, fraction from an unsigned short.
    pub fn read_integer_fixed_point(&mut self) -> Result<FixedPoint> {
        let integer = self.read_i16()?;
        let fraction = self.read_u16()?;
        Ok(FixedPoint::new(integer as i32, fraction as u32))
    }

    /// Read `len` bytes as text; fixed-width fields are NUL padded.
    pub fn read_string(&mut self, len: usize, encoding: TextEncoding) -> Result<String> {
        let bytes = self.read_bytes(len)?;
        Ok(decode_text(&bytes, encoding))
    }

    /// Read the rest of the payload as text.
    pub fn read_remaining_string(&mut self, encoding: TextEncoding) -> Result<String> {
        let bytes = self.read_remaining_bytes()?;
        Ok(decode_text(&bytes, encoding))
    }
}

impl ByteSource for AtomNode<'_> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.settle()?;
        self.stream.read_exact(buf).map_err(|e| e.at(&self.path))
    }

    fn skip(&mut self, len: u64) -> Result<()> {
        self.settle()?;
        self.stream.skip(len).map_err(|e| e.at(&self.path))
    }

    fn remaining(&self) -> Option<u64> {
        Some(self.stream.bytes_left())
    }

    fn position(&self) -> u64 {
        self.stream.position()
    }
}

impl fmt::Display for AtomNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{}[off={},pos={}", path, self.offset, self.stream.consumed())?;
        if self.stream.is_bounded() {
            write!(f, ",len={}", self.stream.length())?;
        }
        write!(f, "]")
    }
}
