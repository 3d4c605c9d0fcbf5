//! Bus sensor drivers
//!
//! - [`scanner`]: positional field scanner shared by answer parsers
//! - [`ds2`]: DS2 anemometer on the SDI-12 bus
//! - [`registry`]: which sockets are claimed by which driver

pub mod ds2;
pub mod registry;
pub mod scanner;

pub use ds2::{checksum, Ds2, Ds2Error, Ds2Field, Ds2Keys, Ds2State};
pub use registry::SocketRegistry;
pub use scanner::{Delimiter, FieldScanner, ScanState, ScanSummary};
