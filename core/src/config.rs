//! Compile-time configuration
//!
//! Buffer sizes are constants because they size static storage. Everything
//! else is a plain struct with a `Default`, built once by the scheduler and
//! handed to each component's constructor.

use crate::datalog::FileNaming;
use crate::upload::UploadPolicy;

/// Size of a record key or value buffer, terminator slot included
pub const KV_STRING_SIZE: usize = 16;

/// Size of each anemometer field buffer, terminator slot included
pub const DS2_FIELD_SIZE: usize = 7;

/// Longest serialized record line, `;` included, newline excluded
pub const LOG_LINE_BUDGET: usize = 254;

/// Size of a local filename buffer (8.3 name plus terminator slot)
pub const FILENAME_SIZE: usize = 13;

/// Size of the remote path buffer (base directory plus filename)
pub const REMOTE_PATH_SIZE: usize = 40;

/// Largest sensor answer kept for diagnostics (75 data bytes, address, CR LF)
pub const RESPONSE_CAPACITY: usize = 82;

/// Most key-value pairs a record can carry
pub const MAX_RECORD_FIELDS: usize = 12;

/// Anemometer driver configuration
#[derive(Debug, Clone)]
pub struct Ds2Config {
    /// Bus address of the device, printable ASCII; anything else falls back to `'0'`
    pub address: char,
    /// Warm-up delay after powering the socket
    pub settle_ms: u32,
    /// How long to listen for each answer
    pub listen_ms: u32,
    /// Pause after an answer before inspecting the receive buffer
    pub answer_gap_ms: u32,
    /// Identification answers shorter than this mean the device is absent
    pub min_identify_bytes: usize,
    /// Measurement count the device must report after `aM!`
    pub expected_measurements: char,
}

impl Default for Ds2Config {
    fn default() -> Self {
        Self {
            address: '0',
            settle_ms: 300,
            listen_ms: 1000,
            answer_gap_ms: 30,
            min_identify_bytes: 20,
            expected_measurements: '3',
        }
    }
}

/// Local storage configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// How daily filenames are derived from the date
    pub naming: FileNaming,
    /// Name of the unsent-file index on the medium
    pub unsent_index: &'static str,
    /// Directory on the remote server that receives daily files
    pub remote_base_dir: &'static str,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            naming: FileNaming::YearMonthDay,
            unsent_index: "UNSENT.TXT",
            remote_base_dir: "/probe/",
        }
    }
}

/// Key-value POST endpoint
#[derive(Debug, Clone)]
pub struct DweetConfig {
    pub host: &'static str,
    pub port: u16,
    /// Thing name appended to `/dweet/for/`
    pub thing: &'static str,
}

impl Default for DweetConfig {
    fn default() -> Self {
        Self {
            host: "dweet.io",
            port: 80,
            thing: "glacierProbe",
        }
    }
}

/// Upload configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// When a flush of the unsent index is due
    pub policy: UploadPolicy,
    /// Wall time one flush may spend before giving up
    pub time_budget_ms: u64,
    pub dweet: DweetConfig,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            policy: UploadPolicy::Daily,
            time_budget_ms: 60_000,
            dweet: DweetConfig::default(),
        }
    }
}

/// Complete probe configuration, owned by the scheduler
#[derive(Debug, Clone, Default)]
pub struct ProbeConfig {
    pub ds2: Ds2Config,
    pub log: LogConfig,
    pub upload: UploadConfig,
}
