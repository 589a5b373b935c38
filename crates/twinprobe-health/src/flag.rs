//! Shared plugin-manifest health flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide manifest health, written by the manifest loader and read by
/// probes and the request builder.
///
/// Cloning shares the same underlying cell. Starts out healthy.
#[derive(Debug, Clone)]
pub struct SharedHealthFlag {
    healthy: Arc<AtomicBool>,
}

impl SharedHealthFlag {
    /// A new flag reporting healthy.
    pub fn new() -> Self {
        Self::with_value(true)
    }

    /// A new flag with an explicit starting value.
    pub fn with_value(healthy: bool) -> Self {
        Self {
            healthy: Arc::new(AtomicBool::new(healthy)),
        }
    }

    /// Current value. Observes the most recent `write` from any thread.
    pub fn read(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// Last writer wins.
    pub fn write(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::Release);
    }
}

impl Default for SharedHealthFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_healthy() {
        assert!(SharedHealthFlag::new().read());
        assert!(SharedHealthFlag::default().read());
    }

    #[test]
    fn write_is_visible_through_clones() {
        let flag = SharedHealthFlag::new();
        let other = flag.clone();

        other.write(false);
        assert!(!flag.read());

        flag.write(true);
        assert!(other.read());
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let flag = SharedHealthFlag::new();
        let mut handles = Vec::new();

        for i in 0..16 {
            let flag = flag.clone();
            handles.push(std::thread::spawn(move || {
                for j in 0..1_000 {
                    flag.write((i + j) % 2 == 0);
                }
            }));
        }
        let mut readers = Vec::new();
        for _ in 0..16 {
            let flag = flag.clone();
            readers.push(std::thread::spawn(move || {
                let mut seen = [0u32; 2];
                for _ in 0..1_000 {
                    seen[usize::from(flag.read())] += 1;
                }
                seen
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        for r in readers {
            let seen = r.join().unwrap();
            assert_eq!(seen[0] + seen[1], 1_000);
        }

        // Writers are done; the next write is the last one.
        flag.write(false);
        assert!(!flag.read());
        flag.write(true);
        assert!(flag.read());
    }
}
