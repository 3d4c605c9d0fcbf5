//! Socket claim tracking
//!
//! Two drivers bound to the same socket would fight over its rails. The
//! registry is owned by the scheduler and handed to every driver constructor,
//! which claims its socket; a second claim is remembered so the driver can
//! complain when it is switched on.

use probe_hal::Socket;

/// Bitmask of sockets claimed by sensor drivers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocketRegistry {
    claimed: u8,
    redefined: u8,
}

impl SocketRegistry {
    pub const fn new() -> Self {
        Self {
            claimed: 0,
            redefined: 0,
        }
    }

    /// Claim `socket`; returns `false` if it was already claimed
    pub fn claim(&mut self, socket: Socket) -> bool {
        let bit = 1 << socket.index();
        if self.claimed & bit != 0 {
            warn!("socket {} claimed twice", socket.as_str());
            self.redefined |= bit;
            return false;
        }
        self.claimed |= bit;
        true
    }

    pub fn is_claimed(&self, socket: Socket) -> bool {
        self.claimed & (1 << socket.index()) != 0
    }

    /// Whether more than one driver claimed `socket`
    pub fn is_redefined(&self, socket: Socket) -> bool {
        self.redefined & (1 << socket.index()) != 0
    }

    /// Raw claim mask, bit `n` for socket index `n`
    pub fn mask(&self) -> u8 {
        self.claimed
    }
}
