use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use std::net::IpAddr;
use std::sync::LazyLock;

use super::ModelError;

/// Upper bound on distinct source IPs a single user may own
pub const MAX_IPS_PER_USER: usize = 2;

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_.]+$").expect("username pattern compiles"));

/// A user account and the source addresses it connects from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    username: String,
    ip_addresses: Vec<IpAddr>,
}

impl User {
    /// Create a user, validating the username format and address count
    pub fn new(username: impl Into<String>, ip_addresses: Vec<IpAddr>) -> Result<Self, ModelError> {
        let username = username.into();
        if !Self::is_valid_username(&username) {
            return Err(ModelError::InvalidUsername(username));
        }

        if ip_addresses.is_empty() || ip_addresses.len() > MAX_IPS_PER_USER {
            return Err(ModelError::InvalidIpCount(ip_addresses.len()));
        }

        Ok(User {
            username,
            ip_addresses,
        })
    }

    pub fn is_valid_username(username: &str) -> bool {
        USERNAME_PATTERN.is_match(username)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn ip_addresses(&self) -> &[IpAddr] {
        &self.ip_addresses
    }

    pub fn owns_ip(&self, ip: &IpAddr) -> bool {
        self.ip_addresses.contains(ip)
    }

    /// Pick one of the user's addresses uniformly at random
    pub fn pick_ip<R: Rng + ?Sized>(&self, rng: &mut R) -> IpAddr {
        // Non-empty by construction
        *self
            .ip_addresses
            .choose(rng)
            .unwrap_or(&self.ip_addresses[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_valid_user() {
        let user = User::new("john_doe", vec![ip("10.0.0.1")]).unwrap();
        assert_eq!(user.username(), "john_doe");
        assert_eq!(user.ip_addresses().len(), 1);

        assert!(User::new("Jane.Roe", vec![ip("10.0.0.1"), ip("10.0.0.2")]).is_ok());
    }

    #[test]
    fn test_invalid_usernames() {
        for name in ["", "john doe", "john1", "9lives", "alice-b", "über"] {
            let err = User::new(name, vec![ip("10.0.0.1")]).unwrap_err();
            assert_eq!(err, ModelError::InvalidUsername(name.to_string()));
        }
    }

    #[test]
    fn test_invalid_ip_counts() {
        assert_eq!(
            User::new("alice", vec![]).unwrap_err(),
            ModelError::InvalidIpCount(0)
        );

        let three = vec![ip("1.1.1.1"), ip("2.2.2.2"), ip("3.3.3.3")];
        assert_eq!(
            User::new("alice", three).unwrap_err(),
            ModelError::InvalidIpCount(3)
        );
    }

    #[test]
    fn test_pick_ip_single() {
        let user = User::new("alice", vec![ip("1.1.1.1")]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(user.pick_ip(&mut rng), ip("1.1.1.1"));
        }
    }

    #[test]
    fn test_pick_ip_covers_both_addresses() {
        let user = User::new("alice", vec![ip("1.1.1.1"), ip("2.2.2.2")]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let picks: Vec<IpAddr> = (0..200).map(|_| user.pick_ip(&mut rng)).collect();

        assert!(picks.iter().all(|p| user.owns_ip(p)));
        assert!(picks.contains(&ip("1.1.1.1")));
        assert!(picks.contains(&ip("2.2.2.2")));
    }
}
