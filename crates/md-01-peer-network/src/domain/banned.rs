//! Banned IP tracking.

use shared_types::Timestamp;
use std::collections::HashMap;
use std::net::IpAddr;

/// Tracks banned IP addresses with expiration times.
///
/// Membership rejects new inbound connections and removes the peer from
/// the address book unless it is whitelisted.
#[derive(Debug, Clone, Default)]
pub struct BannedIps {
    entries: HashMap<IpAddr, Timestamp>,
}

impl BannedIps {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Ban an address until the given instant.
    pub fn ban(&mut self, ip: IpAddr, until: Timestamp) {
        self.entries.insert(ip, until);
    }

    /// Check whether an address is currently banned.
    pub fn is_banned(&self, ip: &IpAddr, now: Timestamp) -> bool {
        self.entries.get(ip).is_some_and(|until| *until > now)
    }

    /// Lift a ban explicitly. Returns true when an entry was removed.
    pub fn unban(&mut self, ip: &IpAddr) -> bool {
        self.entries.remove(ip).is_some()
    }

    /// Remove expired bans, returning the addresses that became
    /// re-admissible.
    pub fn gc_expired(&mut self, now: Timestamp) -> Vec<IpAddr> {
        let expired: Vec<IpAddr> = self
            .entries
            .iter()
            .filter(|(_, until)| **until <= now)
            .map(|(ip, _)| *ip)
            .collect();
        for ip in &expired {
            self.entries.remove(ip);
        }
        expired
    }

    /// Count of active bans.
    pub fn count(&self, now: Timestamp) -> usize {
        self.entries.values().filter(|until| **until > now).count()
    }
}
