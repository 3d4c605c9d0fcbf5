//! Sensor socket power control

/// Physical sensor attachment point on the datalogger board
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Socket {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Socket {
    /// All sockets, in board order
    pub const ALL: [Socket; 6] = [
        Socket::A,
        Socket::B,
        Socket::C,
        Socket::D,
        Socket::E,
        Socket::F,
    ];

    /// Bit position of this socket in a registration mask
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Get the string representation of this socket
    pub const fn as_str(self) -> &'static str {
        match self {
            Socket::A => "A",
            Socket::B => "B",
            Socket::C => "C",
            Socket::D => "D",
            Socket::E => "E",
            Socket::F => "F",
        }
    }
}

/// Rails and bus routing for one sensor socket
///
/// Implemented by the board support package. Every method is infallible:
/// these are GPIO writes.
pub trait SensorSocket {
    /// Enable the 3V3 and 5V rails feeding the socket
    fn power_on(&mut self);

    /// Disable every rail feeding the socket
    fn power_off(&mut self);

    /// Switch the 12V rail required by SDI-12 devices
    fn set_12v(&mut self, on: bool);

    /// Route the shared serial bus to this socket
    fn select_mux(&mut self);

    /// Drive the bus-enable pin high, detaching the mux from every socket
    fn release_mux(&mut self);
}

/// ON/OFF contract shared by every sensor driver
///
/// `off()` must be safe to call at any time, including when `on()` was never
/// called or failed.
pub trait PowerControllable {
    /// Error returned when the device cannot be brought up
    type Error;

    /// Power the device and confirm it is usable
    fn on(&mut self) -> Result<(), Self::Error>;

    /// Remove power from the device
    fn off(&mut self);
}
