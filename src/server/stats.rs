//! Process-wide connection counters.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct ConnectionStats {
    started_at: Instant,
    total_requests: AtomicU64,
    active_connections: AtomicUsize,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total_requests: AtomicU64::new(0),
            active_connections: AtomicUsize::new(0),
        }
    }

    /// Counts an accepted connection. The returned guard decrements the
    /// active count when dropped, whichever way the connection ends.
    pub fn accept(self: &Arc<Self>) -> ActiveConnection {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        ActiveConnection {
            stats: Arc::clone(self),
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for ConnectionStats {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ActiveConnection {
    stats: Arc<ConnectionStats>,
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        self.stats.active_connections.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_decrements_on_drop() {
        let stats = Arc::new(ConnectionStats::new());

        let first = stats.accept();
        let second = stats.accept();
        assert_eq!(stats.active_connections(), 2);
        assert_eq!(stats.total_requests(), 2);

        drop(first);
        assert_eq!(stats.active_connections(), 1);
        drop(second);
        assert_eq!(stats.active_connections(), 0);
        assert_eq!(stats.total_requests(), 2);
    }
}
