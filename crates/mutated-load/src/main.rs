mod args;

use std::cell::{Cell, RefCell};
use std::net::ToSocketAddrs;
use std::rc::Rc;

use clap::Parser;
use mutated_common::Error;
use mutated_reactor::{IoOp, IoStatus, Reactor, Socket, Token};
use mutated_wire::{format_key, MemcHeader, SetExtras, CMD_SET, CMD_SETQ, HEADER_SIZE};
use tracing::{error, info};

use args::Args;

const KEYLEN: usize = 30;

/// `recv`/`onwire` are advanced both by the send loop and by loud
/// completion callbacks running inside `reactor.poll`, so they live behind
/// `Rc<Cell<_>>` shared with every enqueued read.
#[derive(Clone)]
struct Counters {
    recv: Rc<Cell<u64>>,
    onwire: Rc<Cell<u64>>,
}

impl Counters {
    fn new() -> Self {
        Counters { recv: Rc::new(Cell::new(0)), onwire: Rc::new(Cell::new(0)) }
    }

    fn on_loud_response(&self, notify: u64) {
        self.recv.set(self.recv.get() + notify);
        self.onwire.set(self.onwire.get().saturating_sub(notify));
    }
}

fn main() {
    let args = Args::parse();
    enable_logging(&args);

    if let Err(e) = run(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let addr = args
        .addr
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| Error::config(format!("could not resolve '{}'", args.addr)))?;

    let mut reactor = Reactor::new()?;
    let mut socket = Socket::connect(addr)?;
    reactor.register(socket.mio_stream_mut(), Token(0))?;
    let socket = Rc::new(RefCell::new(socket));

    let value = vec![b'a'; args.valn as usize];
    let counters = Counters::new();
    let mut sent = 0u64;
    let mut seqid = args.start;

    info!(keys = args.keys, valn = args.valn, batch = args.batch, "loading key/value population");

    loop {
        while sent < args.keys && counters.onwire.get() < args.batch {
            let loud = is_loud(sent, args.keys, args.notify);
            send_request(&socket, seqid, &value, !loud, args.notify, &counters)?;
            seqid += 1;
            sent += 1;
            counters.onwire.set(counters.onwire.get() + 1);
        }

        if counters.recv.get() >= args.keys {
            break;
        }

        for (token, readable, writable) in reactor.poll(None)? {
            if token == Token(0) {
                socket.borrow_mut().run_io(readable, writable)?;
            }
        }
    }

    info!(keys = args.keys, "load complete");
    Ok(())
}

/// Whether the `sent`-th (0-indexed) SET in a `toload`-key population must
/// be a loud, non-quiet request: every `notify`th key, and always the last
/// one, so the loader has a response to wait on and can detect completion
/// even when the batch ends mid-window.
fn is_loud(sent: u64, toload: u64, notify: u64) -> bool {
    (sent + 1) % notify == 0 || sent == toload - 1
}

fn send_request(
    socket: &Rc<RefCell<Socket>>,
    seqid: u64,
    value: &[u8],
    quiet: bool,
    notify: u64,
    counters: &Counters,
) -> Result<(), Error> {
    let key = format_key(seqid, KEYLEN);
    let extras = SetExtras { flags: 0, expiration: 0 };
    let body_len = SetExtras::SIZE + key.len() + value.len();
    let opcode = if quiet { CMD_SETQ } else { CMD_SET };
    let header = MemcHeader::request(opcode, key.len() as u16, SetExtras::SIZE as u8, body_len as u32, 0);

    let mut buf = Vec::with_capacity(HEADER_SIZE + body_len);
    let mut hdr_buf = [0u8; HEADER_SIZE];
    header.encode(&mut hdr_buf);
    let mut extras_buf = [0u8; SetExtras::SIZE];
    extras.encode(&mut extras_buf);
    buf.extend_from_slice(&hdr_buf);
    buf.extend_from_slice(&extras_buf);
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(value);

    let mut sock = socket.borrow_mut();
    sock.write(&buf)?;

    if !quiet {
        let counters = counters.clone();
        let header_cb = Box::new(move |_first: &[u8], _second: &[u8], status| {
            if status == IoStatus::Ok {
                counters.on_loud_response(notify);
            }
            0
        });
        sock.enqueue_read(IoOp::new(HEADER_SIZE, header_cb, None))?;
    }

    Ok(())
}

fn enable_logging(args: &Args) {
    let mut builder = tracing_subscriber::fmt().compact();
    if args.quiet {
        builder = builder.with_max_level(tracing::Level::ERROR);
    } else {
        builder = builder.with_max_level(tracing::Level::INFO);
    }
    builder.init();
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scenario 3: keys=10, batch=3, notify=5 — exactly 10 SETs issued, the
    /// 5th (id 5, 0-indexed `sent == 4`) and 10th (id 10, `sent == 9`) loud,
    /// all others quiet.
    #[test]
    fn loud_quiet_pattern_matches_notify_window() {
        let toload = 10;
        let notify = 5;
        let loud: Vec<u64> = (0..toload).filter(|&sent| is_loud(sent, toload, notify)).collect();
        assert_eq!(loud, vec![4, 9]);
    }

    #[test]
    fn every_key_is_sent_exactly_once() {
        let toload = 10;
        let notify = 5;
        let sent_ids: Vec<u64> = (0..toload).collect();
        assert_eq!(sent_ids.len(), toload as usize);
        // loudness is a property of the send, not a second send.
        assert_eq!((0..toload).filter(|&s| is_loud(s, toload, notify)).count(), 2);
    }

    #[test]
    fn last_key_is_always_loud_even_off_notify_window() {
        // keys=7, notify=5: notify windows fall at sent==4; sent==6 is the
        // last key and must be loud regardless, so the loader can detect
        // completion.
        assert!(is_loud(4, 7, 5));
        assert!(is_loud(6, 7, 5));
        assert!(!is_loud(5, 7, 5));
    }

    #[test]
    fn set_request_uses_quiet_opcode_and_loud_uses_set() {
        let key = format_key(5, KEYLEN);
        let extras = SetExtras { flags: 0, expiration: 0 };
        let value = vec![b'a'; 8];
        let body_len = SetExtras::SIZE + key.len() + value.len();

        let quiet_header = MemcHeader::request(CMD_SETQ, key.len() as u16, SetExtras::SIZE as u8, body_len as u32, 0);
        let loud_header = MemcHeader::request(CMD_SET, key.len() as u16, SetExtras::SIZE as u8, body_len as u32, 0);
        assert_eq!(quiet_header.opcode, CMD_SETQ);
        assert_eq!(loud_header.opcode, CMD_SET);
        let _ = extras;
    }
}
