//! Uniform random load balancing strategy.

use rand::Rng;

use crate::load_balancer::{Destination, DestinationPool, LoadBalancer};

/// Picks a destination uniformly at random. Stateless.
#[derive(Debug, Default)]
pub struct Random;

impl Random {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for Random {
    fn choose<'a>(&self, pool: &'a DestinationPool) -> &'a Destination {
        let index = rand::thread_rng().gen_range(0..pool.len());
        pool.at(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_stays_in_pool() {
        let lb = Random::new();
        let pool = DestinationPool::new(
            "svc",
            vec![Destination::new("http://d1"), Destination::new("http://d2")],
        )
        .unwrap();

        for _ in 0..100 {
            let chosen = lb.choose(&pool);
            assert!(pool.destinations().contains(chosen));
        }
    }

    #[test]
    fn test_single_destination() {
        let lb = Random::new();
        let pool = DestinationPool::new("svc", vec![Destination::new("http://only")]).unwrap();
        assert_eq!(lb.choose(&pool).as_str(), "http://only");
    }
}
