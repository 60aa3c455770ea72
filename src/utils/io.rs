// Forward-only big-endian byte sources
//
// `ByteCursor` sits on top of any `Read` and counts absolute bytes consumed.
// `BoundedSubstream` (see mp4::stream) layers on a source and only exposes
// the next N bytes. Both implement `ByteSource`, so bounded streams nest.

use std::io::{self, Read};

use crate::error::{Error, Result};

const CHUNK_SIZE: usize = 8192;

/// A sequential source of bytes that can only move forward.
pub trait ByteSource {
    /// Fill `buf` completely or fail with `TruncatedAtom`.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Discard exactly `len` bytes.
    fn skip(&mut self, len: u64) -> Result<()>;

    /// Bytes still readable, `None` when the source has no declared end.
    fn remaining(&self) -> Option<u64>;

    /// Absolute number of bytes consumed from the underlying reader.
    fn position(&self) -> u64;

    fn read_u8(&mut self) -> Result<u8> {
        let mut buffer = [0u8; 1];
        self.read_exact(&mut buffer)?;
        Ok(buffer[0])
    }

    fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Any non-zero byte is `true`.
    fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    fn read_u16(&mut self) -> Result<u16> {
        let mut buffer = [0u8; 2];
        self.read_exact(&mut buffer)?;
        Ok(u16::from_be_bytes(buffer))
    }

    fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut buffer = [0u8; 4];
        self.read_exact(&mut buffer)?;
        Ok(u32::from_be_bytes(buffer))
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    fn read_u64(&mut self) -> Result<u64> {
        let mut buffer = [0u8; 8];
        self.read_exact(&mut buffer)?;
        Ok(u64::from_be_bytes(buffer))
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(self.read_u64()? as i64)
    }

    /// Read `len` bytes, growing the buffer only as data arrives.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        if let Some(available) = self.remaining() {
            if len as u64 > available {
                return Err(Error::TruncatedAtom {
                    path: String::new(),
                    requested: len as u64,
                    available,
                });
            }
        }
        let mut buffer = Vec::with_capacity(len.min(CHUNK_SIZE));
        let mut chunk = [0u8; CHUNK_SIZE];
        while buffer.len() < len {
            let n = (len - buffer.len()).min(CHUNK_SIZE);
            self.read_exact(&mut chunk[..n])?;
            buffer.extend_from_slice(&chunk[..n]);
        }
        Ok(buffer)
    }
}

/// Big-endian primitive reader over a forward-only `Read`.
pub struct ByteCursor<R> {
    reader: R,
    position: u64,
}

impl<R: Read> ByteCursor<R> {
    pub fn new(reader: R) -> Self {
        ByteCursor {
            reader,
            position: 0,
        }
    }
}

impl<R: Read> ByteSource for ByteCursor<R> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.position += filled as u64;
                    return Err(Error::TruncatedAtom {
                        path: String::new(),
                        requested: buf.len() as u64,
                        available: filled as u64,
                    });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
        self.position += filled as u64;
        Ok(())
    }

    fn skip(&mut self, len: u64) -> Result<()> {
        let mut scratch = [0u8; CHUNK_SIZE];
        let mut skipped = 0u64;
        while skipped < len {
            let chunk = (len - skipped).min(CHUNK_SIZE as u64) as usize;
            match self.reader.read(&mut scratch[..chunk]) {
                Ok(0) => {
                    self.position += skipped;
                    return Err(Error::TruncatedAtom {
                        path: String::new(),
                        requested: len,
                        available: skipped,
                    });
                }
                Ok(n) => skipped += n as u64,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
        self.position += skipped;
        Ok(())
    }

    fn remaining(&self) -> Option<u64> {
        None
    }

    fn position(&self) -> u64 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_big_endian_reads() {
        let data = [0x01, 0x02, 0xFF, 0xFE, 0x00, 0x00, 0x01, 0x00, 0x80];
        let mut cursor = ByteCursor::new(Cursor::new(data));

        assert_eq!(cursor.read_u16().unwrap(), 0x0102);
        assert_eq!(cursor.read_i16().unwrap(), -2);
        assert_eq!(cursor.read_u32().unwrap(), 256);
        assert_eq!(cursor.read_i8().unwrap(), -128);
        assert_eq!(cursor.position(), 9);
    }

    #[test]
    fn test_short_read_is_truncation() {
        let mut cursor = ByteCursor::new(Cursor::new([0u8; 3]));
        match cursor.read_u32() {
            Err(Error::TruncatedAtom {
                requested,
                available,
                ..
            }) => {
                assert_eq!(requested, 4);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_skip_across_chunks() {
        let data = vec![7u8; CHUNK_SIZE * 2 + 10];
        let mut cursor = ByteCursor::new(Cursor::new(data));
        cursor.skip((CHUNK_SIZE * 2 + 5) as u64).unwrap();
        assert_eq!(cursor.position(), (CHUNK_SIZE * 2 + 5) as u64);
        assert!(cursor.skip(6).is_err());
    }

    #[test]
    fn test_oversized_read_fails_without_allocating() {
        let mut cursor = ByteCursor::new(Cursor::new([1u8; 10]));
        assert!(matches!(
            cursor.read_bytes(usize::MAX),
            Err(Error::TruncatedAtom { .. })
        ));
        assert_eq!(cursor.position(), 10);
    }
}
