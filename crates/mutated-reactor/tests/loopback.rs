use std::cell::RefCell;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use mutated_reactor::{IoOp, IoStatus, Reactor, Socket, Token};

/// Drives a `Socket` through connect, send, and a completion fire against a
/// plain blocking `TcpListener` peer — exercising the reactor's
/// edge-triggered drain loop end to end over loopback.
#[test]
fn connect_write_and_receive_round_trip() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 5];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
        stream.write_all(b"world").unwrap();
    });

    let mut reactor = Reactor::new().unwrap();
    let mut socket = Socket::connect(addr).unwrap();
    reactor.register(socket.mio_stream_mut(), Token(0)).unwrap();

    let got: Rc<RefCell<Option<Vec<u8>>>> = Rc::new(RefCell::new(None));
    let got_cb = got.clone();

    let mut requested_read = false;
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        assert!(std::time::Instant::now() < deadline, "test timed out waiting for loopback round trip");
        let events: Vec<_> = reactor.poll(Some(Duration::from_millis(100))).unwrap().collect();
        for (token, readable, writable) in events {
            assert_eq!(token, Token(0));
            socket.run_io(readable, writable).unwrap();
            if writable && socket.is_connected() && !requested_read {
                socket.write(b"hello").unwrap();
                let got_for_op = got_cb.clone();
                let op = IoOp::new(
                    5,
                    Box::new(move |first, second, status| {
                        assert_eq!(status, IoStatus::Ok);
                        let mut buf = Vec::with_capacity(5);
                        buf.extend_from_slice(first);
                        buf.extend_from_slice(second);
                        *got_for_op.borrow_mut() = Some(buf);
                        0
                    }),
                    None,
                );
                socket.enqueue_read(op).unwrap();
                requested_read = true;
            }
        }
        if got.borrow().is_some() {
            break;
        }
    }

    assert_eq!(got.borrow().as_deref(), Some(b"world".as_slice()));
    server.join().unwrap();
}
