//! Module `session`
//!
//! Tracks one connected host application on the bridge.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

pub struct Session {
    addr: SocketAddr,
    connected_at: Instant,
    calls: u64,
}

impl Session {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connected_at: Instant::now(),
            calls: 0,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }

    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }

    pub fn record_call(&mut self) {
        self.calls += 1;
    }
}
