//! Bounds-checked byte cursors
//!
//! All buffer arithmetic in the record codec goes through these two types.
//! Every access checks `position + len` against the slice length with
//! `checked_add`, so a bogus length byte yields an error instead of a read
//! past the end.

/// Cursor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CursorError {
    /// Not enough room (writer) or not enough data (reader)
    OutOfBounds,
}

/// Sequential writer over a mutable byte slice
pub struct Writer<'b> {
    buf: &'b mut [u8],
    pos: usize,
}

impl<'b> Writer<'b> {
    pub fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes written so far
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes still available
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn reserve(&mut self, len: usize) -> Result<&mut [u8], CursorError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or(CursorError::OutOfBounds)?;
        let start = self.pos;
        self.pos = end;
        Ok(&mut self.buf[start..end])
    }

    pub fn put_u8(&mut self, value: u8) -> Result<(), CursorError> {
        self.reserve(1)?[0] = value;
        Ok(())
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), CursorError> {
        self.reserve(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    pub fn put_i32(&mut self, value: i32) -> Result<(), CursorError> {
        self.put_bytes(&value.to_le_bytes())
    }

    pub fn put_f64(&mut self, value: f64) -> Result<(), CursorError> {
        self.put_bytes(&value.to_le_bytes())
    }
}

/// Sequential reader over a byte slice
///
/// Slices handed out borrow the underlying buffer, not the reader.
#[derive(Debug, Clone)]
pub struct Reader<'b> {
    buf: &'b [u8],
    pos: usize,
}

impl<'b> Reader<'b> {
    pub fn new(buf: &'b [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Take the next `len` bytes
    pub fn take(&mut self, len: usize) -> Result<&'b [u8], CursorError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or(CursorError::OutOfBounds)?;
        let buf: &'b [u8] = self.buf;
        let bytes = &buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn take_u8(&mut self) -> Result<u8, CursorError> {
        Ok(self.take(1)?[0])
    }

    pub fn take_i32(&mut self) -> Result<i32, CursorError> {
        self.take_array().map(i32::from_le_bytes)
    }

    pub fn take_f64(&mut self) -> Result<f64, CursorError> {
        self.take_array().map(f64::from_le_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_fills_exactly() {
        let mut buf = [0u8; 5];
        let mut w = Writer::new(&mut buf);
        w.put_u8(7).unwrap();
        w.put_i32(-2).unwrap();
        assert_eq!(w.remaining(), 0);
        assert_eq!(w.put_u8(1), Err(CursorError::OutOfBounds));
        assert_eq!(w.position(), 5);
        assert_eq!(buf, [7, 0xFE, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_writer_rejects_without_partial_write() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf);
        w.put_u8(1).unwrap();
        assert_eq!(w.put_f64(1.0), Err(CursorError::OutOfBounds));
        assert_eq!(w.position(), 1);
        assert_eq!(buf, [1, 0, 0, 0]);
    }

    #[test]
    fn test_reader_values() {
        let mut buf = [0u8; 13];
        let mut w = Writer::new(&mut buf);
        w.put_u8(9).unwrap();
        w.put_i32(123_456).unwrap();
        w.put_f64(-0.25).unwrap();

        let mut r = Reader::new(&buf);
        assert_eq!(r.take_u8(), Ok(9));
        assert_eq!(r.take_i32(), Ok(123_456));
        assert_eq!(r.take_f64(), Ok(-0.25));
        assert!(r.is_empty());
    }

    #[test]
    fn test_reader_huge_length_is_error() {
        let buf = [1u8, 2, 3];
        let mut r = Reader::new(&buf);
        r.take_u8().unwrap();
        assert_eq!(r.take(usize::MAX), Err(CursorError::OutOfBounds));
        assert_eq!(r.take(3), Err(CursorError::OutOfBounds));
        assert_eq!(r.take(2), Ok(&[2u8, 3][..]));
    }
}
