//! Fixed port catalog and synthetic user population

use indicatif::ProgressBar;
use rand::seq::SliceRandom;
use rand::Rng;
use std::net::{IpAddr, Ipv4Addr};

use super::names;
use crate::config::PopulationConfig;
use crate::models::{ModelError, Port, Protocol, User};

/// Well-known services every generated record is drawn from
pub const PORT_CATALOG: [Port; 9] = [
    Port::new(20, Protocol::Tcp),
    Port::new(21, Protocol::Tcp),
    Port::new(22, Protocol::Udp),
    Port::new(23, Protocol::Tcp),
    Port::new(25, Protocol::Tcp),
    Port::new(53, Protocol::Udp),
    Port::new(80, Protocol::Tcp),
    Port::new(194, Protocol::Udp),
    Port::new(443, Protocol::Tcp),
];

/// A uniformly random IPv4 address, each octet in 0-255
pub fn random_ip<R: Rng + ?Sized>(rng: &mut R) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(rng.gen(), rng.gen(), rng.gen(), rng.gen()))
}

pub fn random_port<R: Rng + ?Sized>(rng: &mut R) -> Port {
    *PORT_CATALOG.choose(rng).unwrap_or(&PORT_CATALOG[0])
}

/// Generate the user population
///
/// The first `multi_ip_users` users own `ip_limit` distinct addresses,
/// the rest own a single one. `progress` advances once per user.
pub fn generate_users<R: Rng + ?Sized>(
    rng: &mut R,
    population: &PopulationConfig,
    ip_limit: usize,
    progress: &ProgressBar,
) -> Result<Vec<User>, ModelError> {
    (0..population.user_count)
        .map(|index| {
            let wanted = if index < population.multi_ip_users { ip_limit } else { 1 };
            let mut ip_addresses = Vec::with_capacity(wanted);
            while ip_addresses.len() < wanted {
                let ip = random_ip(rng);
                if !ip_addresses.contains(&ip) {
                    ip_addresses.push(ip);
                }
            }
            progress.inc(1);
            User::new(names::random_username(rng), ip_addresses)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_port_catalog() {
        let numbers: Vec<u16> = PORT_CATALOG.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![20, 21, 22, 23, 25, 53, 80, 194, 443]);

        let udp: Vec<u16> = PORT_CATALOG
            .iter()
            .filter(|p| p.protocol == Protocol::Udp)
            .map(|p| p.number)
            .collect();
        assert_eq!(udp, vec![22, 53, 194]);
    }

    #[test]
    fn test_random_port_in_catalog() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            assert!(PORT_CATALOG.contains(&random_port(&mut rng)));
        }
    }

    #[test]
    fn test_default_population_shape() {
        let mut rng = StdRng::seed_from_u64(5);
        let users = generate_users(&mut rng, &PopulationConfig::default(), 2, &ProgressBar::hidden()).unwrap();

        assert_eq!(users.len(), 500);
        assert!(users[..151].iter().all(|u| u.ip_addresses().len() == 2));
        assert!(users[151..].iter().all(|u| u.ip_addresses().len() == 1));

        let total_ips: usize = users.iter().map(|u| u.ip_addresses().len()).sum();
        assert_eq!(total_ips, 651);
    }

    #[test]
    fn test_progress_advances_per_user() {
        let mut rng = StdRng::seed_from_u64(5);
        let progress = ProgressBar::hidden();
        let population = PopulationConfig {
            user_count: 25,
            multi_ip_users: 5,
        };
        generate_users(&mut rng, &population, 2, &progress).unwrap();
        assert_eq!(progress.position(), 25);
    }

    #[test]
    fn test_multi_ip_addresses_are_distinct() {
        let mut rng = StdRng::seed_from_u64(9);
        let population = PopulationConfig {
            user_count: 50,
            multi_ip_users: 50,
        };
        let users = generate_users(&mut rng, &population, 2, &ProgressBar::hidden()).unwrap();
        for user in &users {
            let distinct: HashSet<_> = user.ip_addresses().iter().collect();
            assert_eq!(distinct.len(), 2);
        }
    }

    #[test]
    fn test_single_ip_limit() {
        let mut rng = StdRng::seed_from_u64(9);
        let users = generate_users(&mut rng, &PopulationConfig::default(), 1, &ProgressBar::hidden()).unwrap();
        assert!(users.iter().all(|u| u.ip_addresses().len() == 1));
    }
}
