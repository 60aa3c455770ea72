// Length-limited view over another byte source

use crate::error::{Error, Result};
use crate::utils::io::ByteSource;

/// Exposes only the next `length` bytes of `inner`.
///
/// Every read is forwarded to `inner`, so the bytes are also accounted for
/// by each enclosing stream. A read or skip past `remaining` fails before
/// touching the inner source.
pub struct BoundedSubstream<'a> {
    inner: &'a mut (dyn ByteSource + 'a),
    length: u64,
    remaining: u64,
}

impl<'a> BoundedSubstream<'a> {
    pub fn new(inner: &'a mut (dyn ByteSource + 'a), length: u64) -> Self {
        BoundedSubstream {
            inner,
            length,
            remaining: length,
        }
    }

    /// A stream over the whole of `inner`, used for the file root.
    pub fn unbounded(inner: &'a mut (dyn ByteSource + 'a)) -> Self {
        Self::new(inner, u64::MAX)
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    /// Bytes consumed from this stream so far.
    pub fn consumed(&self) -> u64 {
        self.length - self.remaining
    }

    pub fn is_bounded(&self) -> bool {
        self.length != u64::MAX
    }

    fn check(&self, requested: u64) -> Result<()> {
        if requested > self.remaining {
            return Err(Error::TruncatedAtom {
                path: String::new(),
                requested,
                available: self.remaining,
            });
        }
        Ok(())
    }

    /// Drain everything left in this stream.
    pub fn skip_all(&mut self) -> Result<()> {
        let rest = self.remaining;
        self.skip(rest)
    }

    pub fn bytes_left(&self) -> u64 {
        self.remaining
    }
}

impl ByteSource for BoundedSubstream<'_> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.check(buf.len() as u64)?;
        let before = self.inner.position();
        let result = self.inner.read_exact(buf);
        // a failed inner read may still have consumed bytes
        self.remaining -= (self.inner.position() - before).min(self.remaining);
        result
    }

    fn skip(&mut self, len: u64) -> Result<()> {
        self.check(len)?;
        let before = self.inner.position();
        let result = self.inner.skip(len);
        self.remaining -= (self.inner.position() - before).min(self.remaining);
        result
    }

    fn remaining(&self) -> Option<u64> {
        if self.is_bounded() {
            Some(self.remaining)
        } else {
            None
        }
    }

    fn position(&self) -> u64 {
        self.inner.position()
    }
}
