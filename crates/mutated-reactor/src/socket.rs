use std::io::{self, IoSlice, IoSliceMut, Read, Write};
use std::net::SocketAddr;
use std::time::Duration;

use mio::net::TcpStream as MioTcpStream;
use mutated_common::Error;
use mutated_ringbuf::{ByteRing, ObjectRing};
use socket2::{Domain, Protocol, Socket as Socket2, Type};
use tracing::trace;

use crate::ioop::{split_off, IoOp};

/// Bytes of rx/tx buffering per socket. Sized generously above any single
/// request/response pair this workspace's generators produce.
const RX_CAPACITY: usize = 64 * 1024;
const TX_CAPACITY: usize = 64 * 1024;

/// Maximum pipelining depth: outstanding rx completions per socket.
const MAX_OUTSTANDING: usize = 4096;

/// A non-blocking TCP connection with ring-buffered rx/tx pipelines and a
/// FIFO queue of pending receive completions.
///
/// Edge-triggered readiness means `rx_ready`/`tx_ready` only flip true on a
/// poll event; both directions must be drained in a loop until `WouldBlock`
/// or the relevant queue empties, or a later readiness edge would never
/// arrive to wake the drain back up.
pub struct Socket {
    stream: MioTcpStream,
    rx: ByteRing,
    tx: ByteRing,
    completions: ObjectRing<IoOp>,
    connected: bool,
    rx_ready: bool,
    tx_ready: bool,
}

impl Socket {
    /// Creates the fd, disables Nagle, sets zero-linger (so a later close
    /// sends RST instead of lingering in TIME_WAIT), and kicks off a
    /// non-blocking connect. The connection may still be in progress when
    /// this returns; completion is observed via a writable event.
    pub fn connect(addr: SocketAddr) -> Result<Self, Error> {
        let domain = Domain::for_address(addr);
        let socket = Socket2::new(domain, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_nonblocking(true)?;
        socket.set_nodelay(true)?;
        socket.set_linger(Some(Duration::ZERO))?;

        match socket.connect(&addr.into()) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) if e.raw_os_error() == Some(libc_einprogress()) => {}
            Err(e) => return Err(e.into()),
        }

        let std_stream: std::net::TcpStream = socket.into();
        let stream = MioTcpStream::from_std(std_stream);

        Ok(Socket {
            stream,
            rx: ByteRing::new(RX_CAPACITY),
            tx: ByteRing::new(TX_CAPACITY),
            completions: ObjectRing::new(MAX_OUTSTANDING),
            connected: false,
            rx_ready: false,
            tx_ready: false,
        })
    }

    pub fn mio_stream_mut(&mut self) -> &mut MioTcpStream {
        &mut self.stream
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Queues `data` for transmission and flushes immediately if the socket
    /// is already known writable.
    pub fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        self.tx.write(data)?;
        if self.tx_ready {
            self.drain_tx()?;
        }
        Ok(())
    }

    /// Queues a receive completion and services it immediately if bytes are
    /// already sitting in the rx ring (or the socket is readable).
    pub fn enqueue_read(&mut self, op: IoOp) -> Result<(), Error> {
        self.completions.push(op)?;
        if self.rx_ready {
            self.drain_rx()?;
        }
        Ok(())
    }

    /// Handles a poll event: drains tx on writable (checking connect status
    /// first), drains rx on readable.
    pub fn run_io(&mut self, readable: bool, writable: bool) -> Result<(), Error> {
        if writable {
            if !self.connected {
                if let Some(err) = self.stream.take_error()? {
                    return Err(err.into());
                }
                self.connected = true;
                trace!("socket connected");
            }
            self.tx_ready = true;
            self.drain_tx()?;
        }
        if readable {
            self.rx_ready = true;
            self.drain_rx()?;
        }
        Ok(())
    }

    fn drain_tx(&mut self) -> Result<(), Error> {
        loop {
            if self.tx.is_empty() {
                break;
            }
            let (first, second) = self.tx.peek(self.tx.len());
            let bufs = [IoSlice::new(first), IoSlice::new(second)];
            match self.stream.write_vectored(&bufs) {
                Ok(0) => {
                    return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0").into())
                }
                Ok(n) => self.tx.drop_front(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.tx_ready = false;
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn drain_rx(&mut self) -> Result<(), Error> {
        loop {
            if self.completions.is_empty() {
                break;
            }
            let space = self.rx.space();
            if space == 0 {
                return Err(Error::overflow("rx ring full with completions still pending"));
            }
            let (first, second) = self.rx.prepare_write(space);
            let mut bufs = [IoSliceMut::new(first), IoSliceMut::new(second)];
            match self.stream.read_vectored(&mut bufs) {
                Ok(0) => {
                    return Err(
                        io::Error::new(io::ErrorKind::UnexpectedEof, "peer closed connection").into(),
                    )
                }
                Ok(n) => self.rx.commit_write(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.rx_ready = false;
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
            self.dispatch_completions();
        }
        Ok(())
    }

    fn dispatch_completions(&mut self) {
        loop {
            let Some(op) = self.completions.front_mut() else { break };
            let needed = op.needed();
            if self.rx.len() < needed {
                break;
            }
            if !op.is_awaiting_body() {
                let header_len = op.header_len();
                let (first, second) = self.rx.peek(header_len);
                let done = op.feed_header(first, second);
                if done {
                    self.rx.drop_front(header_len);
                    self.completions.drop_front(1);
                }
            } else {
                let header_len = op.header_len();
                let total = op.needed();
                let (first, second) = self.rx.peek(total);
                let (body_first, body_second) = split_off(first, second, header_len);
                op.feed_body(body_first, body_second);
                self.rx.drop_front(total);
                self.completions.drop_front(1);
            }
        }
    }

    /// Cancels every outstanding completion with an error status — called
    /// when the socket has failed and no more bytes will ever arrive.
    pub fn cancel_pending(&mut self) {
        while let Some(op) = self.completions.pop_front() {
            op.cancel();
        }
    }
}

#[cfg(unix)]
fn libc_einprogress() -> i32 {
    115 // EINPROGRESS on Linux; matched defensively alongside WouldBlock.
}

#[cfg(not(unix))]
fn libc_einprogress() -> i32 {
    i32::MIN
}
