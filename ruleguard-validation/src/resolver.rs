// Host resolution for the `active_url` rule

use crate::config::{DEFAULT_DNS_MAX_LOOKUPS, DEFAULT_DNS_TIMEOUT_MS};
use std::net::ToSocketAddrs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Answers whether a host name resolves.
///
/// This is the only place validation may block. Implementations must not
/// panic and must treat every failure as "does not resolve".
pub trait HostResolver: Send + Sync {
    fn resolves(&self, host: &str) -> bool;
}

/// Resolver backed by the operating system's lookup, bounded by a timeout.
///
/// Each lookup runs on a helper thread. When the timeout elapses the thread is
/// left to finish on its own and the host is reported as unreachable. At most
/// `max_lookups` helper threads exist at once; while that many are still
/// running, further hosts are reported as unreachable without a lookup.
#[derive(Debug, Clone)]
pub struct SystemResolver {
    timeout: Duration,
    max_lookups: usize,
    in_flight: Arc<AtomicUsize>,
    lookup: fn(&str) -> bool,
}

impl SystemResolver {
    /// Create a resolver with the given lookup timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            max_lookups: DEFAULT_DNS_MAX_LOOKUPS,
            in_flight: Arc::new(AtomicUsize::new(0)),
            lookup: system_lookup,
        }
    }

    /// Set the maximum number of concurrent lookup threads
    pub fn with_max_lookups(mut self, max_lookups: usize) -> Self {
        self.max_lookups = max_lookups;
        self
    }

    /// Get the lookup timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the maximum number of concurrent lookup threads
    pub fn max_lookups(&self) -> usize {
        self.max_lookups
    }

    /// Number of lookup threads still running, including timed-out ones.
    ///
    /// Shared between clones.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Option<LookupSlot> {
        let count = self.in_flight.fetch_add(1, Ordering::AcqRel);
        if count >= self.max_lookups {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            return None;
        }
        Some(LookupSlot(Arc::clone(&self.in_flight)))
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_DNS_TIMEOUT_MS))
    }
}

impl HostResolver for SystemResolver {
    fn resolves(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }

        let Some(slot) = self.acquire() else {
            debug!(host, max_lookups = self.max_lookups, "dns lookups saturated, rejecting");
            return false;
        };

        let (tx, rx) = mpsc::channel();
        let owned = host.to_string();
        let lookup = self.lookup;
        // The slot is released when the thread finishes, or when the closure
        // is dropped because the thread could not be spawned
        let spawned = thread::Builder::new()
            .name("ruleguard-dns".to_string())
            .spawn(move || {
                let _slot = slot;
                let _ = tx.send(lookup(&owned));
            });

        if let Err(e) = spawned {
            debug!(host, error = %e, "could not spawn dns lookup thread");
            return false;
        }

        match rx.recv_timeout(self.timeout) {
            Ok(found) => found,
            Err(_) => {
                debug!(host, timeout_ms = self.timeout.as_millis() as u64, "dns lookup timed out");
                false
            }
        }
    }
}

/// Holds one of the resolver's lookup slots until dropped
struct LookupSlot(Arc<AtomicUsize>);

impl Drop for LookupSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

fn system_lookup(host: &str) -> bool {
    (host, 80)
        .to_socket_addrs()
        .map(|mut addrs| addrs.next().is_some())
        .unwrap_or(false)
}

/// Resolver that answers from a fixed list of hosts, without touching the
/// network.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: Vec<String>,
}

impl StaticResolver {
    /// Create a resolver that resolves exactly `hosts`
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }
}

impl HostResolver for StaticResolver {
    fn resolves(&self, host: &str) -> bool {
        self.hosts.iter().any(|h| h == host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_resolver() {
        let resolver = StaticResolver::new(["example.com"]);
        assert!(resolver.resolves("example.com"));
        assert!(!resolver.resolves("example.com/path"));
        assert!(!resolver.resolves("other.test"));
    }

    #[test]
    fn test_system_resolver_rejects_empty_host() {
        assert!(!SystemResolver::default().resolves(""));
    }

    #[test]
    fn test_system_resolver_localhost() {
        // Literal addresses resolve without a DNS server
        assert!(SystemResolver::new(Duration::from_secs(5)).resolves("127.0.0.1"));
    }

    fn slow_lookup(_host: &str) -> bool {
        thread::sleep(Duration::from_millis(300));
        true
    }

    fn slow_resolver(max_lookups: usize) -> SystemResolver {
        SystemResolver {
            lookup: slow_lookup,
            ..SystemResolver::new(Duration::from_millis(10)).with_max_lookups(max_lookups)
        }
    }

    #[test]
    fn test_saturated_resolver_rejects_lookups() {
        let resolver = slow_resolver(2);

        for _ in 0..6 {
            assert!(!resolver.resolves("slow.test"));
        }
        assert_eq!(resolver.in_flight(), 2);

        thread::sleep(Duration::from_millis(1_000));
        assert_eq!(resolver.in_flight(), 0);
    }

    #[test]
    fn test_concurrent_lookups_stay_bounded() {
        let resolver = slow_resolver(3);

        thread::scope(|scope| {
            for _ in 0..16 {
                let resolver = resolver.clone();
                scope.spawn(move || resolver.resolves("slow.test"));
            }
        });
        assert!(resolver.in_flight() <= 3);

        thread::sleep(Duration::from_millis(1_000));
        assert_eq!(resolver.in_flight(), 0);
    }

    #[test]
    fn test_zero_lookups_never_resolves() {
        let resolver = SystemResolver::new(Duration::from_secs(5)).with_max_lookups(0);
        assert!(!resolver.resolves("127.0.0.1"));
        assert_eq!(resolver.in_flight(), 0);
    }

    #[test]
    fn test_system_resolver_unresolvable() {
        let resolver = SystemResolver::new(Duration::from_secs(5));
        assert!(!resolver.resolves("host with spaces.invalid"));
    }
}
