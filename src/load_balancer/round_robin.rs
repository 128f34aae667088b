//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use crate::load_balancer::{Destination, DestinationPool, LoadBalancer};

/// Round-robin selector.
/// Keeps one rotation cursor per pool; the k-th call for a pool returns
/// `destinations[(k - 1) % len]`.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursors: DashMap<String, AtomicUsize>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_slot(&self, key: &str) -> usize {
        if let Some(cursor) = self.cursors.get(key) {
            return cursor.fetch_add(1, Ordering::Relaxed);
        }
        // First call for this pool: the entry lock serializes creation.
        self.cursors
            .entry(key.to_owned())
            .or_default()
            .fetch_add(1, Ordering::Relaxed)
    }
}

impl LoadBalancer for RoundRobin {
    fn choose<'a>(&self, pool: &'a DestinationPool) -> &'a Destination {
        let slot = self.next_slot(pool.key());
        let destination = pool.at(slot);
        tracing::trace!(
            pool = %pool.key(),
            slot,
            destination = %destination,
            "Round-robin selection"
        );
        destination
    }

    fn retain_pools(&self, keep: &dyn Fn(&str) -> bool) {
        self.cursors.retain(|key, _| keep(key.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn pool(key: &str, bases: &[&str]) -> DestinationPool {
        DestinationPool::new(key, bases.iter().map(|b| Destination::new(*b)).collect()).unwrap()
    }

    #[test]
    fn test_retain_pools_resets_removed_cursors() {
        let lb = RoundRobin::new();
        let a = pool("svc-a", &["http://a1", "http://a2"]);
        let b = pool("svc-b", &["http://b1", "http://b2"]);
        lb.choose(&a);
        lb.choose(&b);

        lb.retain_pools(&|key| key == "svc-b");
        assert_eq!(lb.cursors.len(), 1);

        assert_eq!(lb.choose(&a).as_str(), "http://a1");
        assert_eq!(lb.choose(&b).as_str(), "http://b2");
    }

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        let p = pool("svc-a", &["http://d1", "http://d2"]);

        assert_eq!(lb.choose(&p).as_str(), "http://d1");
        assert_eq!(lb.choose(&p).as_str(), "http://d2");
        assert_eq!(lb.choose(&p).as_str(), "http://d1");
    }

    #[test]
    fn test_full_cycle_then_repeat() {
        let lb = RoundRobin::new();
        let bases = ["http://a", "http://b", "http://c", "http://d", "http://e"];
        let p = pool("svc", &bases);

        let first_cycle: Vec<_> = (0..bases.len()).map(|_| lb.choose(&p).clone()).collect();
        let expected: Vec<_> = bases.iter().map(|b| Destination::new(*b)).collect();
        assert_eq!(first_cycle, expected);

        assert_eq!(lb.choose(&p), &first_cycle[0]);
    }

    #[test]
    fn test_cursors_are_per_pool() {
        let lb = RoundRobin::new();
        let a = pool("svc-a", &["http://a1", "http://a2"]);
        let b = pool("svc-b", &["http://b1", "http://b2"]);

        assert_eq!(lb.choose(&a).as_str(), "http://a1");
        assert_eq!(lb.choose(&b).as_str(), "http://b1");
        assert_eq!(lb.choose(&a).as_str(), "http://a2");
        assert_eq!(lb.choose(&b).as_str(), "http://b2");
    }

    #[test]
    fn test_concurrent_selection_is_fair() {
        let lb = Arc::new(RoundRobin::new());
        let p = Arc::new(pool("svc", &["http://d1", "http://d2", "http://d3"]));
        let threads = 8;
        let per_thread = 300;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let lb = lb.clone();
                let p = p.clone();
                std::thread::spawn(move || {
                    (0..per_thread)
                        .map(|_| lb.choose(&p).clone())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut counts: HashMap<Destination, usize> = HashMap::new();
        for handle in handles {
            for d in handle.join().unwrap() {
                *counts.entry(d).or_default() += 1;
            }
        }

        // 2400 slots over 3 destinations: no lost or duplicated cursor update.
        assert_eq!(counts.len(), 3);
        for count in counts.values() {
            assert_eq!(*count, threads * per_thread / 3);
        }
    }
}
