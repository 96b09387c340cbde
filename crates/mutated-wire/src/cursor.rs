use mutated_common::Error;

/// A read cursor over a byte slice, used to decode fixed-size wire structs
/// without bounds-check boilerplate at every field.
pub struct ParseCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ParseCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ParseCursor { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        if self.remaining() < n {
            return Err(Error::protocol(format!(
                "short read: need {n} bytes, {} remain",
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    pub fn u16_be(&mut self) -> Result<u16, Error> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn u32_be(&mut self) -> Result<u32, Error> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn u64_be(&mut self) -> Result<u64, Error> {
        Ok(u64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn u32_le(&mut self) -> Result<u32, Error> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn u64_le(&mut self) -> Result<u64, Error> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], Error> {
        self.take(n)
    }
}

/// A minimal write cursor into a fixed-size, caller-owned buffer.
pub struct WriteCursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> WriteCursor<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        WriteCursor { buf, pos: 0 }
    }

    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    pub fn put_u8(&mut self, v: u8) {
        self.put(&[v]);
    }

    pub fn put_u16_be(&mut self, v: u16) {
        self.put(&v.to_be_bytes());
    }

    pub fn put_u32_be(&mut self, v: u32) {
        self.put(&v.to_be_bytes());
    }

    pub fn put_u64_be(&mut self, v: u64) {
        self.put(&v.to_be_bytes());
    }

    pub fn put_u32_le(&mut self, v: u32) {
        self.put(&v.to_le_bytes());
    }

    pub fn put_u64_le(&mut self, v: u64) {
        self.put(&v.to_le_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.put(bytes);
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}
