use crate::error::DecodeError;

/// Width of a big-endian length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthPrefix {
    U8,
    U16,
    U24,
}

/// Bounds-checked, forward-only reader over a byte slice.
///
/// Every read either consumes exactly the bytes it asks for or fails with
/// [`DecodeError::Truncated`] and leaves the offset where it was. A cursor
/// returned by [`Cursor::read_length_prefixed`] is bounded by its own
/// declared length, so nested readers can never reach into the bytes that
/// follow their field.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u24(&mut self) -> Result<u32, DecodeError> {
        let b = self.read_bytes(3)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::truncated(n, self.remaining()));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Reads exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Reads a length of the given width, then returns a cursor over exactly
    /// that many following bytes.
    pub fn read_length_prefixed(&mut self, width: LengthPrefix) -> Result<Cursor<'a>, DecodeError> {
        let start = self.pos;
        let len = match width {
            LengthPrefix::U8 => self.read_u8()? as usize,
            LengthPrefix::U16 => self.read_u16()? as usize,
            LengthPrefix::U24 => self.read_u24()? as usize,
        };
        match self.read_bytes(len) {
            Ok(body) => Ok(Cursor::new(body)),
            Err(e) => {
                self.pos = start;
                Err(e)
            }
        }
    }

    /// Consumes and returns everything left.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let out = &self.data[self.pos..];
        self.pos = self.data.len();
        out
    }
}
