use bytes::Bytes;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::Duration;

/// Default ingest capacity: enough for ~2790 TS packets of headroom
/// between the feeder and the driver FIFO.
pub const DEFAULT_CAPACITY: usize = 512 * 1024;

/// Bounded wait for space before a push gives up with a partial accept.
const PUSH_WAIT: Duration = Duration::from_millis(20);

struct Inner {
    chunks: VecDeque<Bytes>,
    bytes: usize,
    open: bool,
}

/// Bounded byte queue between the feeder thread and the decode pipeline.
///
/// Guarded independently of the control-path mutex so high-frequency
/// `push` calls never queue behind control operations. `push` never blocks
/// beyond one bounded wait; under sustained backpressure it returns a
/// partial (possibly zero) accept count and the feeder retries.
pub struct IngestQueue {
    inner: Mutex<Inner>,
    space: Condvar,
    data: Condvar,
    capacity: usize,
}

impl IngestQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                chunks: VecDeque::new(),
                bytes: 0,
                open: false,
            }),
            space: Condvar::new(),
            data: Condvar::new(),
            capacity,
        }
    }

    /// Reopens the queue for a new playback session.
    pub fn open(&self) {
        self.inner.lock().open = true;
    }

    /// Closes the queue; subsequent pushes accept 0 bytes.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.open = false;
        self.space.notify_all();
        self.data.notify_all();
    }

    /// Discards all buffered chunks.
    pub fn flush(&self) {
        let mut inner = self.inner.lock();
        inner.chunks.clear();
        inner.bytes = 0;
        self.space.notify_all();
    }

    /// Copies as much of `data` as fits and returns the accepted count.
    ///
    /// Waits at most `PUSH_WAIT` for space when full, then accepts what it
    /// can — zero if still full or the queue is closed.
    pub fn push(&self, data: &[u8]) -> usize {
        if data.is_empty() {
            return 0;
        }
        let mut inner = self.inner.lock();
        if !inner.open {
            return 0;
        }
        if inner.bytes >= self.capacity {
            self.space.wait_for(&mut inner, PUSH_WAIT);
            if !inner.open {
                return 0;
            }
        }
        let free = self.capacity.saturating_sub(inner.bytes);
        let take = free.min(data.len());
        if take == 0 {
            return 0;
        }
        inner.chunks.push_back(Bytes::copy_from_slice(&data[..take]));
        inner.bytes += take;
        self.data.notify_one();
        take
    }

    /// Pops the oldest chunk, waiting up to `wait` for data to arrive.
    pub fn pop(&self, wait: Duration) -> Option<Bytes> {
        let mut inner = self.inner.lock();
        if inner.chunks.is_empty() {
            self.data.wait_for(&mut inner, wait);
        }
        let chunk = inner.chunks.pop_front()?;
        inner.bytes -= chunk.len();
        self.space.notify_all();
        Some(chunk)
    }

    pub fn buffered_bytes(&self) -> usize {
        self.inner.lock().bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn closed_queue_accepts_nothing() {
        let q = IngestQueue::new(1024);
        assert_eq!(q.push(&[0u8; 188]), 0);
        q.open();
        assert_eq!(q.push(&[0u8; 188]), 188);
        q.close();
        assert_eq!(q.push(&[0u8; 188]), 0);
    }

    #[test]
    fn partial_accept_at_capacity() {
        let q = IngestQueue::new(200);
        q.open();
        assert_eq!(q.push(&[0u8; 188]), 188);
        // 12 bytes of headroom left.
        assert_eq!(q.push(&[0u8; 188]), 12);
        assert_eq!(q.buffered_bytes(), 200);
        // Full queue: bounded wait, then zero accept.
        assert_eq!(q.push(&[0u8; 1]), 0);
    }

    #[test]
    fn pop_frees_space_for_retry() {
        let q = IngestQueue::new(188);
        q.open();
        assert_eq!(q.push(&[1u8; 188]), 188);
        assert_eq!(q.push(&[2u8; 188]), 0);
        let chunk = q.pop(Duration::from_millis(1)).unwrap();
        assert_eq!(chunk.len(), 188);
        assert_eq!(chunk[0], 1);
        assert_eq!(q.push(&[2u8; 188]), 188);
    }

    #[test]
    fn flush_empties_queue() {
        let q = IngestQueue::new(1024);
        q.open();
        q.push(&[0u8; 400]);
        q.flush();
        assert_eq!(q.buffered_bytes(), 0);
        assert!(q.pop(Duration::from_millis(1)).is_none());
    }

    #[test]
    fn feeder_drains_across_threads() {
        use std::sync::Arc;
        let q = Arc::new(IngestQueue::new(188 * 4));
        q.open();
        let feeder = {
            let q = Arc::clone(&q);
            std::thread::spawn(move || {
                let packet = [0x47u8; 188];
                let mut sent = 0usize;
                while sent < 188 * 64 {
                    let mut off = 0;
                    while off < packet.len() {
                        off += q.push(&packet[off..]);
                    }
                    sent += packet.len();
                }
                sent
            })
        };
        let mut received = 0usize;
        while received < 188 * 64 {
            if let Some(chunk) = q.pop(Duration::from_millis(50)) {
                received += chunk.len();
            }
        }
        assert_eq!(feeder.join().unwrap(), received);
    }
}
