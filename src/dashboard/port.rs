//! Free-port discovery for the dashboard listener

use std::net::TcpListener;
use std::ops::RangeInclusive;

use rand::Rng;
use tracing::debug;

use crate::error::{ExplainError, Result};

/// Whether `host:port` can currently be bound
pub fn port_available(host: &str, port: u16) -> bool {
    TcpListener::bind((host, port)).is_ok()
}

/// Draw random ports from `range` until one is free, at most `max_attempts` draws
pub fn find_free_port(host: &str, range: RangeInclusive<u16>, max_attempts: usize) -> Result<u16> {
    check_range(&range)?;
    let mut rng = rand::thread_rng();
    for attempt in 1..=max_attempts {
        let port = rng.gen_range(range.clone());
        if port_available(host, port) {
            debug!(port, attempt, "Found free dashboard port");
            return Ok(port);
        }
        debug!(port, attempt, "Port in use, retrying");
    }
    Err(ExplainError::PortBindFailure {
        attempts: max_attempts,
        reason: format!("no free port in {}..={}", range.start(), range.end()),
    })
}

/// Bind a listener, drawing fresh ports on collision unless the port is fixed
pub(crate) fn bind_listener(
    host: &str,
    preferred: u16,
    fixed: bool,
    range: RangeInclusive<u16>,
    max_attempts: usize,
) -> Result<TcpListener> {
    if !fixed {
        check_range(&range)?;
    }
    let mut port = preferred;
    let mut last_error = String::new();
    for attempt in 1..=max_attempts.max(1) {
        match TcpListener::bind((host, port)) {
            Ok(listener) => return Ok(listener),
            Err(e) => {
                debug!(port, attempt, error = %e, "Dashboard bind failed");
                last_error = e.to_string();
                if fixed {
                    return Err(ExplainError::PortBindFailure {
                        attempts: attempt,
                        reason: format!("{}:{}: {}", host, port, e),
                    });
                }
                port = rand::thread_rng().gen_range(range.clone());
            }
        }
    }
    Err(ExplainError::PortBindFailure {
        attempts: max_attempts.max(1),
        reason: last_error,
    })
}

fn check_range(range: &RangeInclusive<u16>) -> Result<()> {
    if range.is_empty() {
        return Err(ExplainError::Configuration(format!(
            "empty dashboard port range {}..={}",
            range.start(),
            range.end()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port_in_range() {
        let port = find_free_port("127.0.0.1", 49152..=65535, 10).unwrap();
        assert!(port >= 49152);
    }

    #[test]
    fn test_occupied_single_port_range_fails() {
        let held = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = held.local_addr().unwrap().port();

        assert!(!port_available("127.0.0.1", port));
        let result = find_free_port("127.0.0.1", port..=port, 3);
        assert!(matches!(result, Err(ExplainError::PortBindFailure { attempts: 3, .. })));
    }

    #[test]
    fn test_fixed_port_collision_is_fatal() {
        let held = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = held.local_addr().unwrap().port();

        let result = bind_listener("127.0.0.1", port, true, 49152..=65535, 10);
        assert!(matches!(result, Err(ExplainError::PortBindFailure { attempts: 1, .. })));
    }

    #[test]
    fn test_auto_port_collision_is_retried() {
        let held = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = held.local_addr().unwrap().port();

        let listener = bind_listener("127.0.0.1", port, false, 49152..=65535, 10).unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), port);
    }

    #[test]
    fn test_empty_range_is_rejected() {
        assert!(matches!(
            find_free_port("127.0.0.1", 60000..=50000, 3),
            Err(ExplainError::Configuration(_))
        ));
        assert!(matches!(
            bind_listener("127.0.0.1", 60000, false, 60000..=50000, 3),
            Err(ExplainError::Configuration(_))
        ));
    }
}
