//! Time sources

/// Real-time clock plus a monotonic millisecond counter
pub trait Clock {
    /// Seconds since the Unix epoch, UTC, as kept by the RTC
    fn unix_secs(&mut self) -> u64;

    /// Milliseconds since boot; may wrap
    fn uptime_ms(&mut self) -> u64;
}
