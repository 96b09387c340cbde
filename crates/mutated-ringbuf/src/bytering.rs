/// Fixed-capacity circular byte buffer used for socket rx/tx pipelines.
///
/// Unlike a `VecDeque<u8>`, callers need direct access to the underlying
/// storage so the reactor can hand the kernel a scatter/gather `IoSlice`
/// pair instead of linearising a wraparound with a copy.
pub struct ByteRing {
    buf: Vec<u8>,
    capacity: usize,
    head: usize,
    len: usize,
}

impl ByteRing {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be non-zero");
        ByteRing { buf: vec![0u8; capacity], capacity, head: 0, len: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn space(&self) -> usize {
        self.capacity - self.len
    }

    fn tail(&self) -> usize {
        (self.head + self.len) % self.capacity
    }

    /// Returns up to `requested` bytes of writable space as two mutable
    /// segments (the second is empty unless the write wraps). Does not
    /// advance the tail; pair with `commit_write`.
    pub fn prepare_write(&mut self, requested: usize) -> (&mut [u8], &mut [u8]) {
        let avail = requested.min(self.space());
        let tail = self.tail();
        let first_len = avail.min(self.capacity - tail);
        let second_len = avail - first_len;
        let (before, from_tail) = self.buf.split_at_mut(tail);
        (&mut from_tail[..first_len], &mut before[..second_len])
    }

    /// Advances the tail by `n`. `n` must not exceed the space most recently
    /// offered by `prepare_write`.
    pub fn commit_write(&mut self, n: usize) {
        debug_assert!(n <= self.space(), "commit_write exceeds prepared space");
        self.len += n;
    }

    /// Copies `data` into the ring, wrapping as needed. Fails if there isn't
    /// enough space.
    pub fn write(&mut self, data: &[u8]) -> Result<(), mutated_common::Error> {
        if data.len() > self.space() {
            return Err(mutated_common::Error::overflow(format!(
                "write of {} bytes exceeds {} available",
                data.len(),
                self.space()
            )));
        }
        let (first, second) = self.prepare_write(data.len());
        let (a, b) = data.split_at(first.len());
        first.copy_from_slice(a);
        second.copy_from_slice(b);
        self.commit_write(data.len());
        Ok(())
    }

    /// Returns up to `requested` readable bytes as two immutable segments.
    /// Does not advance the head; pair with `drop_front`.
    pub fn peek(&self, requested: usize) -> (&[u8], &[u8]) {
        let avail = requested.min(self.len);
        let head = self.head;
        let first_len = avail.min(self.capacity - head);
        let second_len = avail - first_len;
        let (before, from_head) = self.buf.split_at(head);
        (&from_head[..first_len], &before[..second_len])
    }

    /// Advances the head by `n`, discarding that many bytes from the front.
    pub fn drop_front(&mut self, n: usize) {
        debug_assert!(n <= self.len, "drop_front exceeds available bytes");
        self.head = (self.head + n) % self.capacity;
        self.len -= n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ring_has_full_space() {
        let ring = ByteRing::new(16);
        assert_eq!(ring.space(), 16);
        assert_eq!(ring.len(), 0);
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut ring = ByteRing::new(16);
        ring.write(b"hello").unwrap();
        assert_eq!(ring.len(), 5);
        let (a, b) = ring.peek(5);
        let mut got = a.to_vec();
        got.extend_from_slice(b);
        assert_eq!(got, b"hello");
    }

    #[test]
    fn wraparound_splits_into_two_segments() {
        // capacity 16, empty buffer positioned with head == tail == 12
        let mut ring = ByteRing::new(16);
        ring.head = 12;
        let (first, second) = ring.prepare_write(8);
        assert_eq!(first.len(), 4);
        assert_eq!(second.len(), 4);
        ring.commit_write(8);
        assert_eq!(ring.tail(), 4);
        assert_eq!(ring.len(), 8);
    }

    #[test]
    fn overflow_write_is_rejected() {
        let mut ring = ByteRing::new(4);
        let err = ring.write(b"12345").unwrap_err();
        assert!(matches!(err, mutated_common::Error::Overflow(_)));
    }

    #[test]
    fn items_plus_space_equals_capacity() {
        let mut ring = ByteRing::new(16);
        for _ in 0..5 {
            ring.write(b"ab").unwrap();
            ring.drop_front(1);
            assert_eq!(ring.len() + ring.space(), ring.capacity());
        }
    }
}
