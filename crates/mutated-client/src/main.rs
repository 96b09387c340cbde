mod args;

use std::cell::RefCell;
use std::collections::HashMap;
use std::net::{SocketAddr, ToSocketAddrs};
use std::rc::Rc;
use std::time::{Duration, Instant};

use clap::Parser;
use mutated_common::{ClockSource, Error, SystemClock};
use mutated_generators::{ConnMode, ConnectionPool, Generator, MemcacheGenerator, RequestOutcome, SyntheticGenerator};
use mutated_reactor::{Reactor, Socket, Token};
use mutated_scheduler::{PhaseController, Scheduler, Timeline};
use mutated_stats::{Report, ResultsCollector};
use tracing::{error, info, warn};

use args::{Args, GeneratorKind};

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Runtime(#[from] Error),

    #[error("could not resolve '{0}' to a socket address")]
    UnresolvedAddr(String),
}

/// One open connection: the socket (kept around so the reactor can register
/// and later deregister its fd) and the generator wrapping it.
struct Connection {
    socket: Rc<RefCell<Socket>>,
    generator: Rc<dyn Generator>,
}

fn main() {
    let args = Args::parse();
    enable_logging(&args);

    if let Err(e) = run(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let clock = SystemClock;
    let addr = resolve_addr(&args.addr)?;
    let mut reactor = Reactor::new()?;
    let mut connections: HashMap<Token, Connection> = HashMap::new();
    let mut next_token = 0usize;

    let pool = build_pool(args, addr, &mut reactor, &mut connections, &mut next_token)?;

    let timeline = Timeline::build(
        args.req_per_s,
        args.warmup_seconds as f64,
        args.measurement_samples() as usize,
        args.cooldown_seconds as f64,
    );
    let mut scheduler = Scheduler::new(timeline, clock.now());
    let phase = Rc::new(RefCell::new(PhaseController::new(
        scheduler.pre_samples(),
        scheduler.measure_samples(),
        scheduler.post_samples(),
    )));
    let collector = Rc::new(RefCell::new(ResultsCollector::new()));

    info!(
        total = scheduler.total_samples(),
        measure = scheduler.measure_samples(),
        "starting experiment"
    );

    while !scheduler.is_exhausted() || !phase.borrow().is_complete() {
        let timeout = if args.spin_wait {
            Some(Duration::ZERO)
        } else {
            scheduler.next_wakeup().map(|wake| wake.saturating_duration_since(clock.now()))
        };

        let mut failed = Vec::new();
        for (token, readable, writable) in reactor.poll(timeout)? {
            let Some(conn) = connections.get(&token) else { continue };
            if let Err(e) = conn.generator.run_io(readable, writable) {
                warn!(?token, "socket failed: {e}");
                conn.socket.borrow_mut().cancel_pending();
                if pool.mode() != ConnMode::PerRequest {
                    return Err(e.into());
                }
                failed.push(token);
            }
        }
        for token in failed {
            if let Some(conn) = connections.remove(&token) {
                let _ = reactor.deregister(conn.socket.borrow_mut().mio_stream_mut());
            }
        }

        let now = clock.now();
        let due = scheduler.poll_due(now);
        for _ in 0..due {
            send_one(args, &pool, &mut reactor, &mut connections, &mut next_token, addr, &phase, &collector, &clock)?;
        }
    }

    let requests_per_sec = phase.borrow().throughput().unwrap_or(0.0);
    let measurement_window = phase.borrow().elapsed_window().unwrap_or(Duration::from_secs(1));
    let report = Report::build(
        args.label.clone(),
        &mut collector.borrow_mut(),
        requests_per_sec,
        measurement_window,
        scheduler.missed_send_window(),
    );

    if args.machine_readable {
        print!("{}", Report::raw_samples_report(requests_per_sec, &collector.borrow()));
    } else {
        println!("{report}");
    }

    Ok(())
}

fn send_one(
    args: &Args,
    pool: &ConnectionPool,
    reactor: &mut Reactor,
    connections: &mut HashMap<Token, Connection>,
    next_token: &mut usize,
    addr: SocketAddr,
    phase: &Rc<RefCell<PhaseController>>,
    collector: &Rc<RefCell<ResultsCollector>>,
    clock: &impl ClockSource,
) -> Result<(), CliError> {
    let measure = phase.borrow_mut().on_send(clock.now());

    let mut factory = || -> Result<Rc<dyn Generator>, Error> {
        let conn = open_connection(args, addr, reactor, next_token)?;
        let generator = conn.generator.clone();
        connections.insert(Token(*next_token - 1), conn);
        Ok(generator)
    };
    let generator = pool.get_connection(&mut factory)?;

    let cb_phase = phase.clone();
    let cb_collector = collector.clone();
    let cb = Box::new(move |result: Result<RequestOutcome, Error>| {
        let now = Instant::now();
        cb_phase.borrow_mut().on_receive(measure, now);
        match result {
            Ok(outcome) if outcome.measure => {
                let mut c = cb_collector.borrow_mut();
                c.record_service(outcome.service_us);
                if let Some(q) = outcome.queue_us {
                    c.record_queue(q);
                }
                if let Some(w) = outcome.wait_us {
                    c.record_wait(w);
                }
                c.add_rx_bytes(outcome.bytes_received as u64);
            }
            Ok(_) => {}
            Err(e) => warn!("request failed: {e}"),
        }
    });

    let bytes_sent = generator.send_request(measure, cb)?;
    collector.borrow_mut().add_tx_bytes(bytes_sent as u64);
    Ok(())
}

fn build_pool(
    args: &Args,
    addr: SocketAddr,
    reactor: &mut Reactor,
    connections: &mut HashMap<Token, Connection>,
    next_token: &mut usize,
) -> Result<ConnectionPool, CliError> {
    let mode = args.conn_mode();
    if mode == ConnMode::PerRequest {
        return Ok(ConnectionPool::per_request());
    }

    let mut generators = Vec::with_capacity(args.connection_count);
    for _ in 0..args.connection_count {
        let conn = open_connection(args, addr, reactor, next_token)?;
        generators.push(conn.generator.clone());
        connections.insert(Token(*next_token - 1), conn);
    }
    Ok(ConnectionPool::preallocated(mode, generators))
}

fn open_connection(
    args: &Args,
    addr: SocketAddr,
    reactor: &mut Reactor,
    next_token: &mut usize,
) -> Result<Connection, Error> {
    let mut socket = Socket::connect(addr)?;
    let token = Token(*next_token);
    *next_token += 1;
    reactor.register(socket.mio_stream_mut(), token)?;

    let socket = Rc::new(RefCell::new(socket));
    let generator: Rc<dyn Generator> = match args.generator {
        GeneratorKind::Synthetic => {
            Rc::new(SyntheticGenerator::new(socket.clone(), args.service_us_mean, args.service_dist()))
        }
        GeneratorKind::Memcache => {
            Rc::new(MemcacheGenerator::new(socket.clone(), args.records, args.set_ratio, args.value_size))
        }
    };

    Ok(Connection { socket, generator })
}

fn resolve_addr(addr: &str) -> Result<SocketAddr, CliError> {
    addr.to_socket_addrs()?.next().ok_or_else(|| CliError::UnresolvedAddr(addr.to_string()))
}

fn enable_logging(args: &Args) {
    let mut builder = tracing_subscriber::fmt().compact();

    if args.quiet {
        builder = builder.with_max_level(tracing::Level::ERROR);
    } else {
        match args.verbose {
            2.. => builder = builder.with_max_level(tracing::Level::TRACE),
            1 => builder = builder.with_max_level(tracing::Level::DEBUG),
            _ => builder = builder.with_max_level(tracing::Level::INFO),
        }
    }

    builder.init();
}
