use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use mutated_common::Error;
use mutated_reactor::{IoOp, IoStatus, Socket};
use mutated_wire::{format_key, MemcHeader, SetExtras, CMD_GET, CMD_SET, HEADER_SIZE};

use crate::generator::{CompletionCb, Generator, RequestOutcome};

/// Generator for the memcached binary protocol: issues a mix of `GET`/`SET`
/// requests against a fixed key pool and measures round-trip latency. The
/// response body is discarded — this is a load generator, not a cache
/// client.
pub struct MemcacheGenerator {
    socket: Rc<RefCell<Socket>>,
    records: u64,
    set_ratio: f64,
    value_size: usize,
    keylen: usize,
    next_key: Cell<u64>,
}

impl MemcacheGenerator {
    pub fn new(socket: Rc<RefCell<Socket>>, records: u64, set_ratio: f64, value_size: usize) -> Self {
        MemcacheGenerator { socket, records, set_ratio, value_size, keylen: 30, next_key: Cell::new(1) }
    }

    /// Advances the 1-based key index by one, wrapping back to 1 after
    /// `records`. A free-standing formula so it can be pinned without a
    /// live socket.
    fn next_key_id(current: u64, records: u64) -> u64 {
        let records = records.max(1);
        if current >= records {
            1
        } else {
            current + 1
        }
    }

    fn build_get(&self, key: &str, opaque: u32) -> Vec<u8> {
        let header = MemcHeader::request(CMD_GET, key.len() as u16, 0, key.len() as u32, opaque);
        let mut buf = Vec::with_capacity(HEADER_SIZE + key.len());
        let mut hdr_buf = [0u8; HEADER_SIZE];
        header.encode(&mut hdr_buf);
        buf.extend_from_slice(&hdr_buf);
        buf.extend_from_slice(key.as_bytes());
        buf
    }

    fn build_set(&self, key: &str, opaque: u32) -> Vec<u8> {
        let extras = SetExtras { flags: 0, expiration: 0 };
        let body_len = SetExtras::SIZE + key.len() + self.value_size;
        let header = MemcHeader::request(CMD_SET, key.len() as u16, SetExtras::SIZE as u8, body_len as u32, opaque);
        let mut buf = Vec::with_capacity(HEADER_SIZE + body_len);
        let mut hdr_buf = [0u8; HEADER_SIZE];
        header.encode(&mut hdr_buf);
        let mut extras_buf = [0u8; SetExtras::SIZE];
        extras.encode(&mut extras_buf);
        buf.extend_from_slice(&hdr_buf);
        buf.extend_from_slice(&extras_buf);
        buf.extend_from_slice(key.as_bytes());
        buf.resize(buf.len() + self.value_size, b'a');
        buf
    }
}

impl Generator for MemcacheGenerator {
    fn send_request(&self, measure: bool, cb: CompletionCb) -> Result<usize, Error> {
        let key_id = self.next_key.get();
        self.next_key.set(Self::next_key_id(key_id, self.records));
        let key = format_key(key_id, self.keylen);
        let opaque = fastrand::u32(..);

        let is_set = fastrand::f64() < self.set_ratio;
        let payload = if is_set { self.build_set(&key, opaque) } else { self.build_get(&key, opaque) };
        let bytes_sent = payload.len();

        let start_ts = Instant::now();
        {
            let mut sock = self.socket.borrow_mut();
            sock.write(&payload)?;
            let sent_ts = Instant::now();

            let header_cb = Box::new(move |first: &[u8], second: &[u8], status| -> usize {
                if status == IoStatus::Err {
                    return 0;
                }
                let mut buf = [0u8; HEADER_SIZE];
                buf[..first.len()].copy_from_slice(first);
                buf[first.len()..].copy_from_slice(second);
                match MemcHeader::decode(&buf) {
                    Ok(header) => header.body_len as usize,
                    Err(_) => 0,
                }
            });

            let body_cb = Box::new(move |first: &[u8], second: &[u8], status| {
                if status == IoStatus::Err {
                    cb(Err(Error::protocol("socket failed while awaiting memcache response")));
                    return;
                }
                let now = Instant::now();
                let service_us = now.duration_since(start_ts).as_micros() as u64;
                let queue_us = sent_ts.duration_since(start_ts).as_micros() as u64;
                let bytes_received = HEADER_SIZE + first.len() + second.len();

                cb(Ok(RequestOutcome {
                    service_us,
                    queue_us: Some(queue_us),
                    wait_us: None,
                    measure,
                    bytes_received,
                }));
            });

            sock.enqueue_read(IoOp::new(HEADER_SIZE, header_cb, Some(body_cb)))?;
        }

        Ok(bytes_sent)
    }

    fn run_io(&self, readable: bool, writable: bool) -> Result<(), Error> {
        self.socket.borrow_mut().run_io(readable, writable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutated_wire::MemcHeader as Hdr;

    fn make_generator() -> MemcacheGenerator {
        // Socket::connect requires a real address; these tests only touch
        // the pure packet-building helpers, so they construct the struct
        // via a loopback listener to obtain a valid Socket.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let socket = mutated_reactor::Socket::connect(addr).unwrap();
        MemcacheGenerator::new(Rc::new(RefCell::new(socket)), 10_000, 0.1, 128)
    }

    #[test]
    fn build_get_has_no_extras_and_matching_body_len() {
        let gen = make_generator();
        let key = format_key(42, gen.keylen);
        let buf = gen.build_get(&key, 7);
        let header = Hdr::decode(&buf[..HEADER_SIZE]).unwrap();
        assert_eq!(header.extras_len, 0);
        assert_eq!(header.body_len as usize, key.len());
        assert_eq!(buf.len(), HEADER_SIZE + key.len());
    }

    #[test]
    fn build_set_includes_extras_key_and_value() {
        let gen = make_generator();
        let key = format_key(7, gen.keylen);
        let buf = gen.build_set(&key, 1);
        let header = Hdr::decode(&buf[..HEADER_SIZE]).unwrap();
        assert_eq!(header.extras_len as usize, SetExtras::SIZE);
        assert_eq!(buf.len(), HEADER_SIZE + SetExtras::SIZE + key.len() + gen.value_size);
    }

    /// Scenario 2: with a single-record pool, every request must target the
    /// same 1-based key, not a uniform-random draw over `[0, records)`.
    #[test]
    fn single_record_pool_always_selects_key_one() {
        let mut key_id = 1u64;
        for _ in 0..1000 {
            assert_eq!(key_id, 1);
            key_id = MemcacheGenerator::next_key_id(key_id, 1);
        }
        assert_eq!(format_key(1, 30), format!("key-{:0>26}", 1));
    }

    #[test]
    fn key_index_wraps_after_records() {
        let mut key_id = 1u64;
        let seen: Vec<u64> = (0..6)
            .map(|_| {
                let id = key_id;
                key_id = MemcacheGenerator::next_key_id(key_id, 3);
                id
            })
            .collect();
        assert_eq!(seen, vec![1, 2, 3, 1, 2, 3]);
    }
}
