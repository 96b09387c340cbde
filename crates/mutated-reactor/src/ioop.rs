/// Whether a completion fired because data actually arrived, or because the
/// socket failed and pending completions are being cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoStatus {
    Ok,
    Err,
}

type HeaderCb = Box<dyn FnOnce(&[u8], &[u8], IoStatus) -> usize>;
type BodyCb = Box<dyn FnOnce(&[u8], &[u8], IoStatus)>;

enum State {
    AwaitingHeader { header_len: usize, header_cb: HeaderCb, body_cb: Option<BodyCb> },
    AwaitingBody { header_len: usize, body_len: usize, body_cb: Option<BodyCb> },
    Done,
}

/// A pending receive completion: parse `header_len` bytes, let the header
/// callback tell us how many more bytes the body needs, then fire the body
/// callback once the whole record has arrived.
///
/// Consumed strictly in the order requests were sent on the same socket —
/// the reactor's completion queue is a FIFO, never a priority queue.
pub struct IoOp {
    state: State,
}

impl IoOp {
    pub fn new(header_len: usize, header_cb: HeaderCb, body_cb: Option<BodyCb>) -> Self {
        IoOp { state: State::AwaitingHeader { header_len, header_cb, body_cb } }
    }

    /// Total bytes still needed before this completion can fire.
    pub fn needed(&self) -> usize {
        match &self.state {
            State::AwaitingHeader { header_len, .. } => *header_len,
            State::AwaitingBody { header_len, body_len, .. } => header_len + body_len,
            State::Done => 0,
        }
    }

    pub fn header_len(&self) -> usize {
        match &self.state {
            State::AwaitingHeader { header_len, .. } => *header_len,
            State::AwaitingBody { header_len, .. } => *header_len,
            State::Done => 0,
        }
    }

    /// Feeds the header bytes once enough have arrived; transitions to
    /// awaiting the body, or fires immediately if the body is empty.
    /// Returns `true` if the completion is now fully satisfied.
    pub fn feed_header(&mut self, first: &[u8], second: &[u8]) -> bool {
        let state = std::mem::replace(&mut self.state, State::Done);
        match state {
            State::AwaitingHeader { header_len, header_cb, body_cb } => {
                let body_len = header_cb(first, second, IoStatus::Ok);
                if body_len == 0 {
                    if let Some(cb) = body_cb {
                        cb(&[], &[], IoStatus::Ok);
                    }
                    self.state = State::Done;
                    true
                } else {
                    self.state = State::AwaitingBody { header_len, body_len, body_cb };
                    false
                }
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Feeds the body bytes once the whole record has arrived.
    pub fn feed_body(&mut self, first: &[u8], second: &[u8]) {
        let state = std::mem::replace(&mut self.state, State::Done);
        if let State::AwaitingBody { body_cb, .. } = state {
            if let Some(cb) = body_cb {
                cb(first, second, IoStatus::Ok);
            }
        }
    }

    pub fn is_awaiting_body(&self) -> bool {
        matches!(self.state, State::AwaitingBody { .. })
    }

    /// Cancels this completion because the socket failed; callbacks observe
    /// `IoStatus::Err` and empty slices.
    pub fn cancel(self) {
        match self.state {
            State::AwaitingHeader { header_cb, body_cb, .. } => {
                header_cb(&[], &[], IoStatus::Err);
                if let Some(cb) = body_cb {
                    cb(&[], &[], IoStatus::Err);
                }
            }
            State::AwaitingBody { body_cb, .. } => {
                if let Some(cb) = body_cb {
                    cb(&[], &[], IoStatus::Err);
                }
            }
            State::Done => {}
        }
    }
}

/// Splits a two-segment logical byte range at `skip`, preserving the
/// original physical segmentation — used to carve the body portion out of a
/// peek that covers header-plus-body.
pub fn split_off<'a>(first: &'a [u8], second: &'a [u8], skip: usize) -> (&'a [u8], &'a [u8]) {
    if skip <= first.len() {
        (&first[skip..], second)
    } else {
        (&second[skip - first.len()..], &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_only_fires_immediately_when_body_is_empty() {
        let mut fired = false;
        let mut op = IoOp::new(
            4,
            Box::new(|_first, _second, _status| 0),
            None,
        );
        let done = op.feed_header(&[1, 2, 3, 4], &[]);
        assert!(done);
        fired = true;
        assert!(fired);
    }

    #[test]
    fn header_then_body_two_phase() {
        let mut op = IoOp::new(
            4,
            Box::new(|_f, _s, _st| 8),
            Some(Box::new(|body, _s, status| {
                assert_eq!(status, IoStatus::Ok);
                assert_eq!(body.len(), 8);
            })),
        );
        let done = op.feed_header(&[0, 0, 0, 0], &[]);
        assert!(!done);
        assert!(op.is_awaiting_body());
        op.feed_body(&[1, 2, 3, 4, 5, 6, 7, 8], &[]);
    }

    #[test]
    fn split_off_crosses_segment_boundary() {
        let first = [1, 2, 3];
        let second = [4, 5, 6];
        let (a, b) = split_off(&first, &second, 2);
        assert_eq!(a, &[3]);
        assert_eq!(b, &[4, 5, 6]);

        let (a, b) = split_off(&first, &second, 4);
        assert_eq!(a, &[5, 6]);
        assert_eq!(b, &[] as &[u8]);
    }
}
