use mutated_common::Error;

use crate::cursor::{ParseCursor, WriteCursor};

/// Size of a memcached binary-protocol header, in bytes.
pub const HEADER_SIZE: usize = 24;

pub const MAGIC_REQUEST: u8 = 0x80;
pub const MAGIC_RESPONSE: u8 = 0x81;

pub const CMD_GET: u8 = 0x00;
pub const CMD_SET: u8 = 0x01;
pub const CMD_GETQ: u8 = 0x09;
pub const CMD_NOOP: u8 = 0x0a;
pub const CMD_VERSION: u8 = 0x0b;
pub const CMD_STAT: u8 = 0x10;
pub const CMD_SETQ: u8 = 0x11;

pub const STATUS_OK: u16 = 0x0000;
pub const STATUS_KEY_NOT_FOUND: u16 = 0x0001;

/// A decoded/encoded memcached binary protocol header. Multi-byte integer
/// fields are big-endian on the wire; this struct holds them in host order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemcHeader {
    pub magic: u8,
    pub opcode: u8,
    pub key_len: u16,
    pub extras_len: u8,
    pub datatype: u8,
    pub status: u16,
    pub body_len: u32,
    pub opaque: u32,
    pub cas: u64,
}

impl MemcHeader {
    pub fn request(opcode: u8, key_len: u16, extras_len: u8, body_len: u32, opaque: u32) -> Self {
        MemcHeader {
            magic: MAGIC_REQUEST,
            opcode,
            key_len,
            extras_len,
            datatype: 0,
            status: 0,
            body_len,
            opaque,
            cas: 0,
        }
    }

    pub fn encode(&self, out: &mut [u8; HEADER_SIZE]) {
        let mut w = WriteCursor::new(out);
        w.put_u8(self.magic);
        w.put_u8(self.opcode);
        w.put_u16_be(self.key_len);
        w.put_u8(self.extras_len);
        w.put_u8(self.datatype);
        w.put_u16_be(self.status);
        w.put_u32_be(self.body_len);
        w.put_u32_be(self.opaque);
        w.put_u64_be(self.cas);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() != HEADER_SIZE {
            return Err(Error::protocol(format!(
                "memcache header: expected {HEADER_SIZE} bytes, got {}",
                buf.len()
            )));
        }
        let mut c = ParseCursor::new(buf);
        let magic = c.u8()?;
        let opcode = c.u8()?;
        let key_len = c.u16_be()?;
        let extras_len = c.u8()?;
        let datatype = c.u8()?;
        let status = c.u16_be()?;
        let body_len = c.u32_be()?;
        let opaque = c.u32_be()?;
        let cas = c.u64_be()?;
        Ok(MemcHeader { magic, opcode, key_len, extras_len, datatype, status, body_len, opaque, cas })
    }

    /// Length of the value portion of the body, once key and extras are
    /// subtracted. Saturates at zero rather than underflowing on a
    /// malformed header from a misbehaving peer.
    pub fn value_len(&self) -> u32 {
        self.body_len
            .saturating_sub(self.key_len as u32)
            .saturating_sub(self.extras_len as u32)
    }
}

/// Extras field for a `SET`/`SETQ` request: flags and expiration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetExtras {
    pub flags: u32,
    pub expiration: u32,
}

impl SetExtras {
    pub const SIZE: usize = 8;

    pub fn encode(&self, out: &mut [u8; Self::SIZE]) {
        let mut w = WriteCursor::new(out);
        w.put_u32_be(self.flags);
        w.put_u32_be(self.expiration);
    }
}

/// Formats a zero-padded memcached key from a numeric id, matching the
/// fixed-width key pool used to pre-generate load-test keys.
pub fn format_key(id: u64, keylen: usize) -> String {
    let body = format!("{id}");
    let padding = keylen.saturating_sub(4 + body.len());
    format!("key-{}{}", "0".repeat(padding), body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let h = MemcHeader::request(CMD_SET, 5, 8, 20, 0x1234);
        let mut buf = [0u8; HEADER_SIZE];
        h.encode(&mut buf);
        let decoded = MemcHeader::decode(&buf).unwrap();
        assert_eq!(decoded, h);
    }

    #[test]
    fn value_len_subtracts_key_and_extras() {
        let h = MemcHeader::request(CMD_SET, 5, 8, 5 + 8 + 100, 0);
        assert_eq!(h.value_len(), 100);
    }

    #[test]
    fn format_key_is_zero_padded_to_width() {
        let k = format_key(42, 30);
        assert_eq!(k.len(), 30);
        assert!(k.starts_with("key-0"));
        assert!(k.ends_with("42"));
    }

    #[test]
    fn decode_rejects_wrong_size() {
        assert!(MemcHeader::decode(&[0u8; 10]).is_err());
    }
}
