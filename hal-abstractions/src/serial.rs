//! Serial sensor bus link
//!
//! Byte-oriented transport to one addressed device on the shared bus. The
//! link never reports errors: a missing answer shows up as
//! `available() == 0` after [`SerialLink::read_command_answer`] returns.

/// Whether the link is allowed to drive the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Normal operation
    Enabled,
    /// Hard-stopped after a device failed to answer
    Disabled,
}

/// Request/response transport used by bus sensor drivers
///
/// Implementations busy-wait inside `read_command_answer`; the firmware runs
/// a single cooperative loop with nothing else to schedule.
///
/// # Example Implementation
///
/// ```ignore
/// impl SerialLink for Sdi12Uart {
///     fn send_command(&mut self, command: &[u8]) {
///         self.send_break();
///         self.uart.blocking_write(command).ok();
///     }
///     // ...
/// }
/// ```
pub trait SerialLink {
    /// Write a complete framed command (e.g. `b"0M!"`) to the bus
    fn send_command(&mut self, command: &[u8]);

    /// Wait until `expected_len` bytes have arrived or `timeout_ms` elapses
    ///
    /// Whatever arrived stays in the receive buffer.
    fn read_command_answer(&mut self, expected_len: usize, timeout_ms: u32);

    /// Number of unread bytes in the receive buffer
    fn available(&self) -> usize;

    /// Consume one byte from the receive buffer
    fn read(&mut self) -> Option<u8>;

    /// Enable or hard-stop the link
    fn set_state(&mut self, state: LinkState);
}
