use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use mutated_common::Error;
use mutated_reactor::{IoOp, IoStatus, Socket};
use mutated_wire::{SynRequest, SynResponse, REQUEST_SIZE, RESPONSE_SIZE};

use crate::generator::{CompletionCb, Generator, RequestOutcome};

/// How the server-side busy-loop duration commanded in each request is
/// drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceDist {
    Fixed,
    Exponential,
    Lognormal,
}

/// Generator for the synthetic protocol: a fixed-size request carrying an
/// explicit service-time instruction, answered by an echoed tag.
pub struct SyntheticGenerator {
    socket: Rc<RefCell<Socket>>,
    service_us_mean: f64,
    dist: ServiceDist,
    next_tag: Cell<u64>,
}

impl SyntheticGenerator {
    pub fn new(socket: Rc<RefCell<Socket>>, service_us_mean: f64, dist: ServiceDist) -> Self {
        SyntheticGenerator { socket, service_us_mean, dist, next_tag: Cell::new(1) }
    }

    fn gen_service_time(&self) -> u64 {
        sample_service_us(self.dist, self.service_us_mean)
    }
}

/// Draws one commanded service time in microseconds from the configured
/// distribution. A free function so it can be tested without a live
/// socket.
fn sample_service_us(dist: ServiceDist, mean_us: f64) -> u64 {
    match dist {
        ServiceDist::Fixed => mean_us.ceil() as u64,
        ServiceDist::Exponential => {
            let u = 1.0 - fastrand::f64();
            (-u.ln() * mean_us).ceil() as u64
        }
        ServiceDist::Lognormal => {
            let mu = mean_us.max(1.0).ln() - 2.0;
            let sigma = 2.0;
            let u1 = fastrand::f64().max(f64::MIN_POSITIVE);
            let u2 = fastrand::f64();
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            (mu + sigma * z).exp().ceil() as u64
        }
    }
}

impl Generator for SyntheticGenerator {
    fn send_request(&self, measure: bool, cb: CompletionCb) -> Result<usize, Error> {
        let tag = self.next_tag.get();
        self.next_tag.set(tag.wrapping_add(1));
        let service_us = self.gen_service_time();

        let req = SynRequest::single_delay(tag, service_us);
        let mut buf = [0u8; REQUEST_SIZE];
        req.encode(&mut buf);

        let start_ts = Instant::now();
        {
            let mut sock = self.socket.borrow_mut();
            sock.write(&buf)?;

            let op = IoOp::new(
                RESPONSE_SIZE,
                Box::new(move |first, second, status| {
                    if status == IoStatus::Err {
                        cb(Err(Error::protocol("socket failed while awaiting synthetic response")));
                        return 0;
                    }
                    let mut resp_buf = [0u8; RESPONSE_SIZE];
                    resp_buf[..first.len()].copy_from_slice(first);
                    resp_buf[first.len()..].copy_from_slice(second);

                    let now = Instant::now();
                    let service_us_observed = now.duration_since(start_ts).as_micros() as u64;
                    let wait_us = service_us_observed.saturating_sub(service_us);

                    let resp = match SynResponse::decode(&resp_buf) {
                        Ok(resp) => resp,
                        Err(e) => {
                            cb(Err(e));
                            return 0;
                        }
                    };
                    if resp.tag != tag {
                        cb(Err(Error::protocol(format!(
                            "synthetic response tag {} does not match request tag {tag}",
                            resp.tag
                        ))));
                        return 0;
                    }

                    cb(Ok(RequestOutcome {
                        service_us: service_us_observed,
                        queue_us: None,
                        wait_us: Some(wait_us),
                        measure,
                        bytes_received: RESPONSE_SIZE,
                    }));
                    0
                }),
                None,
            );
            sock.enqueue_read(op)?;
        }

        Ok(REQUEST_SIZE)
    }

    fn run_io(&self, readable: bool, writable: bool) -> Result<(), Error> {
        self.socket.borrow_mut().run_io(readable, writable)
    }
}
