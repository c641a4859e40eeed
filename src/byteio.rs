//! Big-endian byte I/O adapters and the bounded sub-reader used to keep
//! heap-dump sub-record parsing inside its declared segment length.

use std::io::{self, Read};

use crate::error::{HprofRedactError, Result};

/// Wraps a shared reader so that only `len` further bytes are visible
/// before the segment is considered exhausted. The outer heap-dump
/// record's declared length is the sole framing authority for its
/// sub-records, which carry no length prefix of their own.
pub struct BoundedReader<'a, R: Read> {
    inner: &'a mut R,
    remaining: u64,
}

impl<'a, R: Read> BoundedReader<'a, R> {
    pub fn new(inner: &'a mut R, len: u64) -> Self {
        BoundedReader {
            inner,
            remaining: len,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Consumes the bounded reader, checking that its segment was fully
    /// and exactly accounted for.
    pub fn finish(self) -> Result<()> {
        if self.remaining == 0 {
            Ok(())
        } else {
            Err(HprofRedactError::SegmentLengthMismatch(self.remaining))
        }
    }

    /// Advances past `n` bytes without materializing them. `std::io::Read`
    /// has no portable bulk-skip primitive, so this always proceeds by
    /// reading through a scratch buffer; a premature end of stream is
    /// fatal, as for any other read inside a declared length.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        let mut left = n;
        let mut scratch = [0u8; 4096];
        while left > 0 {
            let chunk = left.min(scratch.len() as u64) as usize;
            self.read_exact(&mut scratch[..chunk])?;
            left -= chunk as u64;
        }
        Ok(())
    }
}

impl<'a, R: Read> Read for BoundedReader<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let allowed = self.remaining.min(buf.len() as u64) as usize;
        if allowed == 0 {
            return Ok(0);
        }
        let n = self.inner.read(&mut buf[..allowed])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}

/// Copies exactly `len` bytes from `r` to `w`, in bounded-size chunks so
/// that a large opaque record body never needs to be materialized in
/// full (e.g. `AllocSites`, `CpuSamples`, and other tags the pipeline
/// never needs to interpret).
pub fn copy_verbatim<R: Read, W: io::Write>(r: &mut R, w: &mut W, len: u64) -> Result<()> {
    let mut remaining = len;
    let mut buf = [0u8; 64 * 1024];
    while remaining > 0 {
        let chunk = remaining.min(buf.len() as u64) as usize;
        r.read_exact(&mut buf[..chunk])?;
        w.write_all(&buf[..chunk])?;
        remaining -= chunk as u64;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn bounded_reader_reports_exact_exhaustion() {
        let data = vec![1, 2, 3, 4, 5];
        let mut cursor = Cursor::new(data);
        let mut bounded = BoundedReader::new(&mut cursor, 3);
        let mut buf = [0u8; 3];
        bounded.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        bounded.finish().unwrap();
    }

    #[test]
    fn bounded_reader_finish_fails_on_short_consumption() {
        let data = vec![1, 2, 3, 4, 5];
        let mut cursor = Cursor::new(data);
        let mut bounded = BoundedReader::new(&mut cursor, 3);
        let mut buf = [0u8; 1];
        bounded.read_exact(&mut buf).unwrap();
        assert!(bounded.finish().is_err());
    }

    #[test]
    fn bounded_reader_skip_advances_past_segment_bytes() {
        let data = vec![1, 2, 3, 4, 5];
        let mut cursor = Cursor::new(data);
        let mut bounded = BoundedReader::new(&mut cursor, 4);
        bounded.skip(2).unwrap();
        let mut buf = [0u8; 2];
        bounded.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [3, 4]);
        bounded.finish().unwrap();
    }

    #[test]
    fn premature_eof_inside_declared_length_is_fatal() {
        let data = vec![1, 2];
        let mut cursor = Cursor::new(data);
        let mut bounded = BoundedReader::new(&mut cursor, 5);
        let mut buf = [0u8; 5];
        assert!(bounded.read_exact(&mut buf).is_err());
    }
}
