use std::cell::Cell;
use std::rc::Rc;

use mutated_common::Error;

use crate::generator::Generator;

/// How successive requests are assigned to connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnMode {
    /// A fresh connection is opened for every request and torn down on
    /// completion.
    PerRequest,
    /// A fixed pool of connections is opened once, used in round-robin
    /// order.
    RoundRobin,
    /// A fixed pool of connections is opened once, one drawn at random per
    /// request.
    Random,
}

/// Hands out a `Generator` for each outgoing request according to the
/// configured connection mode.
///
/// Every in-flight request holds its own clone of the `Rc<dyn Generator>`
/// (via the completion closure), so a torn-down pool or a scheduler that
/// stops issuing requests can never leave a dangling reference: the
/// generator and its socket stay alive until the last outstanding
/// completion drops its clone.
pub struct ConnectionPool {
    mode: ConnMode,
    generators: Vec<Rc<dyn Generator>>,
    next: Cell<usize>,
}

impl ConnectionPool {
    pub fn per_request() -> Self {
        ConnectionPool { mode: ConnMode::PerRequest, generators: Vec::new(), next: Cell::new(0) }
    }

    pub fn preallocated(mode: ConnMode, generators: Vec<Rc<dyn Generator>>) -> Self {
        assert_ne!(mode, ConnMode::PerRequest, "preallocated pools use round_robin or random");
        assert!(!generators.is_empty(), "preallocated pool needs at least one connection");
        ConnectionPool { mode, generators, next: Cell::new(0) }
    }

    pub fn mode(&self) -> ConnMode {
        self.mode
    }

    /// Returns the generator to use for the next request. `factory` is
    /// invoked only in `PerRequest` mode, where a fresh connection is built
    /// on every call.
    pub fn get_connection(
        &self,
        factory: &mut dyn FnMut() -> Result<Rc<dyn Generator>, Error>,
    ) -> Result<Rc<dyn Generator>, Error> {
        match self.mode {
            ConnMode::PerRequest => factory(),
            ConnMode::RoundRobin => {
                let i = self.next.get();
                self.next.set((i + 1) % self.generators.len());
                Ok(self.generators[i].clone())
            }
            ConnMode::Random => {
                let i = fastrand::usize(0..self.generators.len());
                Ok(self.generators[i].clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutated_common::Error as CommonError;

    struct NullGenerator;
    impl Generator for NullGenerator {
        fn send_request(&self, _measure: bool, _cb: crate::generator::CompletionCb) -> Result<usize, CommonError> {
            Ok(0)
        }
        fn run_io(&self, _r: bool, _w: bool) -> Result<(), CommonError> {
            Ok(())
        }
    }

    #[test]
    fn round_robin_cycles_through_every_connection() {
        let gens: Vec<Rc<dyn Generator>> = (0..3).map(|_| Rc::new(NullGenerator) as Rc<dyn Generator>).collect();
        let pool = ConnectionPool::preallocated(ConnMode::RoundRobin, gens.clone());
        let mut noop = || -> Result<Rc<dyn Generator>, CommonError> { unreachable!() };
        for i in 0..6 {
            let g = pool.get_connection(&mut noop).unwrap();
            assert!(Rc::ptr_eq(&g, &gens[i % 3]));
        }
    }

    #[test]
    fn per_request_always_calls_factory() {
        let pool = ConnectionPool::per_request();
        let mut calls = 0;
        let mut factory = || -> Result<Rc<dyn Generator>, CommonError> {
            calls += 1;
            Ok(Rc::new(NullGenerator) as Rc<dyn Generator>)
        };
        for _ in 0..3 {
            pool.get_connection(&mut factory).unwrap();
        }
        assert_eq!(calls, 3);
    }
}
