use mutated_common::Error;

/// What a generator reports back once a request completes.
#[derive(Debug, Clone, Copy)]
pub struct RequestOutcome {
    /// End-to-end time from enqueue to full response, in microseconds.
    pub service_us: u64,
    /// Client-side buffering delay (time between enqueue and the bytes
    /// actually leaving the socket), when the generator tracks it.
    pub queue_us: Option<u64>,
    /// Queueing/network time with the server's own processing time
    /// subtracted out, when the protocol carries a known service
    /// instruction (synthetic only).
    pub wait_us: Option<u64>,
    /// Whether this request fell inside the measurement window.
    pub measure: bool,
    /// Bytes of response body received (header excluded), for throughput
    /// accounting.
    pub bytes_received: usize,
}

/// Invoked once per request with either the completed outcome or a fatal
/// protocol-level error (socket failure, response-request mismatch,
/// malformed response).
pub type CompletionCb = Box<dyn FnOnce(Result<RequestOutcome, Error>)>;

/// A protocol-specific adapter over a single socket.
///
/// Implementations own their socket (`Rc<RefCell<Socket>>`) and use
/// interior mutability so the trait can be object-safe and stored behind an
/// `Rc<dyn Generator>` shared by the reactor's registry and every in-flight
/// request's completion closure — the shared strong count is what keeps the
/// socket alive until its last outstanding completion fires.
pub trait Generator {
    /// Encodes and sends one request, enqueuing the matching completion.
    /// Returns the number of bytes written to the socket's tx ring.
    fn send_request(&self, measure: bool, cb: CompletionCb) -> Result<usize, Error>;

    /// Forwards a poll event to the underlying socket.
    fn run_io(&self, readable: bool, writable: bool) -> Result<(), Error>;
}
