//! Integration test: dashboard ping with proxy variables in the environment.
//!
//! Kept in its own test binary since it mutates process-wide env vars.

use std::thread::sleep;
use std::time::Duration;

use explain_viz::dashboard::{DashboardConfig, DashboardRunner};

#[test]
fn test_ping_ignores_environment_proxy() {
    for var in ["NO_PROXY", "no_proxy"] {
        std::env::remove_var(var);
    }
    for var in ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"] {
        std::env::set_var(var, "http://127.0.0.1:9");
    }

    let mut runner = DashboardRunner::new(DashboardConfig::local()).unwrap();
    runner.start().unwrap();

    let mut alive = false;
    for _ in 0..50 {
        if runner.ping() {
            alive = true;
            break;
        }
        sleep(Duration::from_millis(100));
    }
    assert!(alive);
    assert!(runner.stop());
}
