//! DS2 sonic anemometer driver
//!
//! The device sits on the shared SDI-12 bus behind the socket mux and speaks
//! addressed ASCII commands (`<address><verb>!`):
//!
//! | command | answer                          | fields                           |
//! |---------|---------------------------------|----------------------------------|
//! | `aI!`   | identification string           | presence check only              |
//! | `aM!`   | `a ttt n`                       | wait `ttt` seconds, `n` values   |
//! | `aD0!`  | `a+ws+wd+temp`                  | wind speed, direction, temperature |
//! | `aR3!`  | `ubar vbar gust` + checksum     | wind components and gust         |
//!
//! `on()` powers the socket and probes for the device; `read()` runs the
//! measurement exchange; `off()` removes power. Parsed values are only valid
//! after `read()` returns `Ok`; any failure leaves every field empty.

use core::fmt;

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use probe_hal::{LinkState, PowerControllable, SensorSocket, SerialLink, Socket};

use crate::config::{Ds2Config, DS2_FIELD_SIZE, RESPONSE_CAPACITY};
use crate::field::{CapacityError, Field};
use crate::record::{Record, RecordError};
use crate::sensors::registry::SocketRegistry;
use crate::sensors::scanner::{scan, Delimiter, FIELD_COUNT};

/// Parsed anemometer value
pub type Ds2Field = Field<DS2_FIELD_SIZE>;

const IDENTIFY: &[u8] = b"I!";
const MEASURE: &[u8] = b"M!";
const SEND_DATA: &[u8] = b"D0!";
const SEND_EXTENDED: &[u8] = b"R3!";

// answer lengths the link waits for, CR LF included
const IDENTIFY_ANSWER_LEN: usize = 33;
const MEASURE_ANSWER_LEN: usize = 7;
const DATA_ANSWER_LEN: usize = 30;
const EXTENDED_ANSWER_LEN: usize = 24;

// positions in the `aD0!` answer
const WIND_SPEED: usize = 0;
const WIND_DIRECTION: usize = 1;
const TEMPERATURE: usize = 2;

// positions in the `aR3!` answer
const UBAR: usize = 0;
const VBAR: usize = 1;
const GUST: usize = 2;

/// Driver lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ds2State {
    Off,
    /// Rails switched on, waiting for the device to settle
    Powering,
    /// Identification sent
    Probing,
    /// Device answered; `read()` allowed
    Responsive,
    /// Device did not answer; powered down again
    Unresponsive,
    /// Measurement exchange in progress
    Measuring,
    /// Last `read()` succeeded
    Complete,
    /// Last `read()` failed; fields are empty
    Failed,
}

/// DS2 errors
///
/// `WrongSocket` is a configuration error, the `No*Response` variants and
/// `Unresponsive` mean the device is absent or silent, everything else means
/// the device answered but broke the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ds2Error {
    /// Socket E and F cannot host an SDI-12 device
    WrongSocket,
    /// Identification answer too short
    Unresponsive,
    /// `read()` called while the device is not on
    NotPowered,
    /// No answer to `aM!`
    NoMeasureResponse,
    /// `aM!` answer is not `a ttt n`
    MalformedMeasureResponse,
    /// Device will not deliver the expected number of values
    UnexpectedMeasurementCount,
    /// No answer to `aD0!`
    NoDataResponse,
    /// `aD0!` answer had no signed field
    NoDataParsed,
    /// No answer to `aR3!`
    NoExtendedResponse,
    /// `aR3!` checksum mismatch
    ChecksumFailed,
}

impl Ds2Error {
    /// Status code reported to the scheduler
    pub const fn code(self) -> u8 {
        match self {
            Self::WrongSocket => 1,
            Self::Unresponsive => 2,
            Self::NotPowered => 3,
            Self::NoMeasureResponse => 4,
            Self::MalformedMeasureResponse => 5,
            Self::UnexpectedMeasurementCount => 6,
            Self::NoDataResponse => 7,
            Self::NoDataParsed => 8,
            Self::NoExtendedResponse => 9,
            Self::ChecksumFailed => 10,
        }
    }

    /// Whether the error means nothing answered on the bus
    pub const fn is_device_absent(self) -> bool {
        matches!(
            self,
            Self::Unresponsive
                | Self::NoMeasureResponse
                | Self::NoDataResponse
                | Self::NoExtendedResponse
        )
    }
}

impl fmt::Display for Ds2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongSocket => write!(f, "socket cannot host an SDI-12 device"),
            Self::Unresponsive => write!(f, "device did not identify"),
            Self::NotPowered => write!(f, "device is not on"),
            Self::NoMeasureResponse => write!(f, "no answer to measure command"),
            Self::MalformedMeasureResponse => write!(f, "malformed measure answer"),
            Self::UnexpectedMeasurementCount => write!(f, "unexpected measurement count"),
            Self::NoDataResponse => write!(f, "no answer to data request"),
            Self::NoDataParsed => write!(f, "no field in data answer"),
            Self::NoExtendedResponse => write!(f, "no answer to extended request"),
            Self::ChecksumFailed => write!(f, "checksum mismatch"),
        }
    }
}

impl core::error::Error for Ds2Error {}

/// Whether `socket` has the 12V rail and bus routing SDI-12 needs
pub const fn supports_sdi12(socket: Socket) -> bool {
    !matches!(socket, Socket::E | Socket::F)
}

/// Modulo-64 checksum over the full fixed width of `fields`
///
/// The result is always printable, in `32..=95`.
pub fn checksum<const N: usize>(fields: &[Field<N>]) -> u8 {
    let sum: u32 = fields.iter().map(Field::fixed_width_sum).sum();
    (sum % 64) as u8 + 32
}

/// Record keys the driver fills in
#[derive(Debug, Clone)]
pub struct Ds2Keys {
    pub wind_speed: &'static str,
    pub wind_direction: &'static str,
    pub temperature: &'static str,
    pub ubar: &'static str,
    pub vbar: &'static str,
    pub gust: &'static str,
}

impl Default for Ds2Keys {
    fn default() -> Self {
        Self {
            wind_speed: "ws",
            wind_direction: "wd",
            temperature: "wtemp",
            ubar: "ubar",
            vbar: "vbar",
            gust: "gust",
        }
    }
}

/// DS2 anemometer on one socket
pub struct Ds2<L, S, D> {
    link: L,
    socket: S,
    delay: D,
    socket_id: Socket,
    address: u8,
    config: Ds2Config,
    state: Ds2State,
    redefined: bool,
    response: Vec<u8, RESPONSE_CAPACITY>,
    data: [Ds2Field; FIELD_COUNT],
    extended: [Ds2Field; FIELD_COUNT],
    checksum: u8,
    received_checksum: Option<u8>,
}

impl<L, S, D> Ds2<L, S, D>
where
    L: SerialLink,
    S: SensorSocket,
    D: DelayNs,
{
    /// Bind a driver to `socket_id`, claiming it in `registry`
    pub fn new(
        socket_id: Socket,
        registry: &mut SocketRegistry,
        link: L,
        socket: S,
        delay: D,
        config: Ds2Config,
    ) -> Self {
        let redefined = !registry.claim(socket_id);
        let address = match u8::try_from(config.address) {
            Ok(address) if address.is_ascii_graphic() => address,
            _ => {
                warn!(
                    "DS2 address {} is not printable ASCII, using '0'",
                    config.address
                );
                b'0'
            }
        };
        Self {
            link,
            socket,
            delay,
            socket_id,
            address,
            config,
            state: Ds2State::Off,
            redefined,
            response: Vec::new(),
            data: Default::default(),
            extended: Default::default(),
            checksum: 0,
            received_checksum: None,
        }
    }

    /// Give back the link, socket and delay
    pub fn release(self) -> (L, S, D) {
        (self.link, self.socket, self.delay)
    }

    pub fn state(&self) -> Ds2State {
        self.state
    }

    pub fn socket_id(&self) -> Socket {
        self.socket_id
    }

    pub fn address(&self) -> char {
        char::from(self.address)
    }

    /// Checksum computed over the last extended answer
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Checksum character the device sent with the last extended answer
    pub fn received_checksum(&self) -> Option<u8> {
        self.received_checksum
    }

    /// Raw bytes of the last answer, capped at `RESPONSE_CAPACITY`
    pub fn last_response(&self) -> &[u8] {
        &self.response
    }

    /// Run the measurement exchange
    ///
    /// Only allowed while the device is on. Every field is cleared first and
    /// stays cleared unless all phases succeed.
    pub fn read(&mut self) -> Result<(), Ds2Error> {
        self.clear_fields();
        self.received_checksum = None;

        match self.state {
            Ds2State::Responsive | Ds2State::Complete | Ds2State::Failed => {}
            _ => return Err(Ds2Error::NotPowered),
        }

        self.state = Ds2State::Measuring;
        debug!("DS2 on socket {} measuring", self.socket_id.as_str());
        match self.measure() {
            Ok(()) => {
                self.state = Ds2State::Complete;
                info!(
                    "DS2 ws={} wd={} t={} u={} v={} g={}",
                    self.data[WIND_SPEED].as_str(),
                    self.data[WIND_DIRECTION].as_str(),
                    self.data[TEMPERATURE].as_str(),
                    self.extended[UBAR].as_str(),
                    self.extended[VBAR].as_str(),
                    self.extended[GUST].as_str(),
                );
                Ok(())
            }
            Err(e) => {
                self.clear_fields();
                self.state = Ds2State::Failed;
                warn!("DS2 read failed: {:?} (code {})", e, e.code());
                Err(e)
            }
        }
    }

    pub fn get_ubar<const M: usize>(&self, dest: &mut Field<M>) -> Result<(), CapacityError> {
        self.extended[UBAR].copy_into(dest)
    }

    pub fn get_vbar<const M: usize>(&self, dest: &mut Field<M>) -> Result<(), CapacityError> {
        self.extended[VBAR].copy_into(dest)
    }

    pub fn get_gust<const M: usize>(&self, dest: &mut Field<M>) -> Result<(), CapacityError> {
        self.extended[GUST].copy_into(dest)
    }

    pub fn get_wind_speed<const M: usize>(
        &self,
        dest: &mut Field<M>,
    ) -> Result<(), CapacityError> {
        self.data[WIND_SPEED].copy_into(dest)
    }

    pub fn get_wind_direction<const M: usize>(
        &self,
        dest: &mut Field<M>,
    ) -> Result<(), CapacityError> {
        self.data[WIND_DIRECTION].copy_into(dest)
    }

    pub fn get_temperature<const M: usize>(
        &self,
        dest: &mut Field<M>,
    ) -> Result<(), CapacityError> {
        self.data[TEMPERATURE].copy_into(dest)
    }

    /// Copy all six values into `record` under `keys`
    ///
    /// A value the record refuses, such as one carrying a separator picked
    /// up from a corrupted answer, is left cleared. The remaining values are
    /// still written and the first refusal is returned.
    pub fn write_record(&self, record: &mut Record, keys: &Ds2Keys) -> Result<(), RecordError> {
        let pairs = [
            (keys.wind_speed, &self.data[WIND_SPEED]),
            (keys.wind_direction, &self.data[WIND_DIRECTION]),
            (keys.temperature, &self.data[TEMPERATURE]),
            (keys.ubar, &self.extended[UBAR]),
            (keys.vbar, &self.extended[VBAR]),
            (keys.gust, &self.extended[GUST]),
        ];
        let mut outcome = Ok(());
        for (key, field) in pairs {
            if let Err(e) = record.set(key, field.as_str()) {
                warn!("DS2 value for {} dropped: {:?}", key, e);
                outcome = outcome.and(Err(e));
            }
        }
        outcome
    }

    fn measure(&mut self) -> Result<(), Ds2Error> {
        let wait_secs = self.start_measurement()?;
        debug!("DS2 measurement ready in {} s", wait_secs);
        self.delay.delay_ms(wait_secs * 1000);
        self.request_data()?;
        self.request_extended()
    }

    /// `aM!`: returns the seconds until data is ready
    fn start_measurement(&mut self) -> Result<u32, Ds2Error> {
        self.exchange(MEASURE, MEASURE_ANSWER_LEN);
        if self.response.is_empty() {
            return Err(Ds2Error::NoMeasureResponse);
        }

        let answer = trim_line_end(&self.response);
        if answer.len() < 5 || answer[0] != self.address {
            return Err(Ds2Error::MalformedMeasureResponse);
        }
        let count = answer[4];
        if u32::from(count) != u32::from(self.config.expected_measurements) {
            warn!(
                "DS2 reports {} values, expected {}",
                char::from(count),
                self.config.expected_measurements
            );
            return Err(Ds2Error::UnexpectedMeasurementCount);
        }

        answer[1..4].iter().try_fold(0u32, |secs, &digit| {
            if digit.is_ascii_digit() {
                Ok(secs * 10 + u32::from(digit - b'0'))
            } else {
                Err(Ds2Error::MalformedMeasureResponse)
            }
        })
    }

    /// `aD0!`: sign-delimited wind speed, direction and temperature
    fn request_data(&mut self) -> Result<(), Ds2Error> {
        self.exchange(SEND_DATA, DATA_ANSWER_LEN);
        if self.response.is_empty() {
            return Err(Ds2Error::NoDataResponse);
        }

        let summary = scan(&self.response, &mut self.data, Delimiter::Sign);
        if summary.overflowed {
            debug!("DS2 data field overflow, scan stopped");
        }
        if summary.delimiters == 0 {
            return Err(Ds2Error::NoDataParsed);
        }
        Ok(())
    }

    /// `aR3!`: whitespace-delimited components and gust, then the checksum
    fn request_extended(&mut self) -> Result<(), Ds2Error> {
        self.exchange(SEND_EXTENDED, EXTENDED_ANSWER_LEN);

        let answer = trim_line_end(&self.response);
        let Some((&received, body)) = answer.split_last() else {
            return Err(Ds2Error::NoExtendedResponse);
        };

        scan(body, &mut self.extended, Delimiter::Whitespace);
        self.checksum = checksum(&self.extended);
        self.received_checksum = Some(received);

        if self.checksum != received {
            warn!(
                "DS2 checksum mismatch: computed {} received {}",
                char::from(self.checksum),
                char::from(received)
            );
            return Err(Ds2Error::ChecksumFailed);
        }
        Ok(())
    }

    /// Send `<address><verb>`, wait for the answer and drain it
    fn exchange(&mut self, verb: &[u8], expected_len: usize) {
        self.send(verb);
        self.link
            .read_command_answer(expected_len, self.config.listen_ms);
        self.capture_response();
    }

    fn send(&mut self, verb: &[u8]) {
        let mut frame = [0u8; 4];
        let len = verb.len().min(frame.len() - 1);
        frame[0] = self.address;
        frame[1..=len].copy_from_slice(&verb[..len]);
        self.link.send_command(&frame[..=len]);
    }

    /// Move everything the link buffered into `response`
    ///
    /// Bytes past `RESPONSE_CAPACITY` are read and dropped so nothing stale
    /// is left for the next command.
    fn capture_response(&mut self) {
        self.response.clear();
        while let Some(byte) = self.link.read() {
            let _ = self.response.push(byte);
        }
    }

    fn clear_fields(&mut self) {
        for field in self.data.iter_mut().chain(self.extended.iter_mut()) {
            field.clear();
        }
    }
}

impl<L, S, D> PowerControllable for Ds2<L, S, D>
where
    L: SerialLink,
    S: SensorSocket,
    D: DelayNs,
{
    type Error = Ds2Error;

    fn on(&mut self) -> Result<(), Ds2Error> {
        if self.redefined {
            warn!("DS2 socket {} is claimed by another driver", self.socket_id.as_str());
        }
        if !supports_sdi12(self.socket_id) {
            warn!("DS2 cannot run on socket {}", self.socket_id.as_str());
            return Err(Ds2Error::WrongSocket);
        }

        self.state = Ds2State::Powering;
        debug!("DS2 on socket {} powering", self.socket_id.as_str());
        self.socket.power_on();
        self.socket.set_12v(true);
        self.delay.delay_ms(self.config.settle_ms);
        self.socket.select_mux();
        self.link.set_state(LinkState::Enabled);

        self.state = Ds2State::Probing;
        debug!("DS2 on socket {} probing", self.socket_id.as_str());
        self.send(IDENTIFY);
        self.link
            .read_command_answer(IDENTIFY_ANSWER_LEN, self.config.listen_ms);
        self.delay.delay_ms(self.config.answer_gap_ms);
        let received = self.link.available();
        self.capture_response();

        if received >= self.config.min_identify_bytes {
            self.state = Ds2State::Responsive;
            info!(
                "DS2 on socket {} identified ({} bytes)",
                self.socket_id.as_str(),
                received
            );
            return Ok(());
        }

        warn!(
            "DS2 on socket {} unresponsive ({} bytes)",
            self.socket_id.as_str(),
            received
        );
        self.link.set_state(LinkState::Disabled);
        self.socket.release_mux();
        self.off();
        self.state = Ds2State::Unresponsive;
        Err(Ds2Error::Unresponsive)
    }

    fn off(&mut self) {
        self.socket.set_12v(false);
        self.socket.power_off();
        self.state = Ds2State::Off;
        debug!("DS2 on socket {} off", self.socket_id.as_str());
    }
}

fn trim_line_end(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != b'\r' && b != b'\n')
        .map_or(0, |idx| idx + 1);
    &bytes[..end]
}

#[cfg(test)]
mod tests {
    use core::str::FromStr;

    use super::*;
    use crate::config::LOG_LINE_BUDGET;
    use crate::serializer::{parse_line, serialize};
    use crate::testing::{RecordingDelay, RecordingSocket, ScriptedLink};

    type TestDs2 = Ds2<ScriptedLink, RecordingSocket, RecordingDelay>;

    fn identification(len: usize) -> std::vec::Vec<u8> {
        let mut answer: std::vec::Vec<u8> = b"013GILLDS2"
            .iter()
            .copied()
            .cycle()
            .take(len - 2)
            .collect();
        answer.extend_from_slice(b"\r\n");
        answer
    }

    fn driver(socket: Socket, link: ScriptedLink) -> TestDs2 {
        let mut registry = SocketRegistry::new();
        Ds2::new(
            socket,
            &mut registry,
            link,
            RecordingSocket::default(),
            RecordingDelay::default(),
            Ds2Config::default(),
        )
    }

    fn full_exchange(checksum: &[u8]) -> ScriptedLink {
        let mut extended = b"+012 -034 056".to_vec();
        extended.extend_from_slice(checksum);
        extended.extend_from_slice(b"\r\n");
        ScriptedLink::new()
            .answer(&identification(25))
            .answer(b"00053\r\n")
            .answer(b"0+1.23+180-5.2\r\n")
            .answer(&extended)
    }

    #[test]
    fn test_on_with_identification() {
        let mut ds2 = driver(Socket::A, ScriptedLink::new().answer(&identification(25)));
        assert_eq!(ds2.on(), Ok(()));
        assert_eq!(ds2.state(), Ds2State::Responsive);

        let (link, socket, delay) = ds2.release();
        assert_eq!(link.sent_strs(), ["0I!"]);
        assert_eq!(link.states, [LinkState::Enabled]);
        assert_eq!(link.listens, [(IDENTIFY_ANSWER_LEN, 1000)]);
        assert_eq!(socket.events, ["power_on", "12v_on", "select_mux"]);
        assert_eq!(delay.waits_ms, [300, 30]);
    }

    #[test]
    fn test_on_short_identification_disables_link() {
        let mut ds2 = driver(Socket::B, ScriptedLink::new().answer(&identification(10)));
        assert_eq!(ds2.on(), Err(Ds2Error::Unresponsive));
        assert_eq!(ds2.state(), Ds2State::Unresponsive);
        assert_eq!(ds2.read(), Err(Ds2Error::NotPowered));

        let (link, socket, _) = ds2.release();
        assert_eq!(link.states, [LinkState::Enabled, LinkState::Disabled]);
        assert_eq!(
            socket.events,
            ["power_on", "12v_on", "select_mux", "release_mux", "12v_off", "power_off"]
        );
    }

    #[test]
    fn test_on_rejects_wrong_socket() {
        for socket in [Socket::E, Socket::F] {
            let mut ds2 = driver(socket, ScriptedLink::new().answer(&identification(25)));
            assert_eq!(ds2.on(), Err(Ds2Error::WrongSocket));
            let (link, socket, delay) = ds2.release();
            assert!(link.sent.is_empty());
            assert!(socket.events.is_empty());
            assert!(delay.waits_ms.is_empty());
        }
    }

    #[test]
    fn test_off_without_on() {
        let mut ds2 = driver(Socket::C, ScriptedLink::new());
        ds2.off();
        assert_eq!(ds2.state(), Ds2State::Off);
        let (_, socket, _) = ds2.release();
        assert_eq!(socket.events, ["12v_off", "power_off"]);
    }

    #[test]
    fn test_read_requires_on() {
        let mut ds2 = driver(Socket::A, full_exchange(b"="));
        assert_eq!(ds2.read(), Err(Ds2Error::NotPowered));
        let (link, _, _) = ds2.release();
        assert!(link.sent.is_empty());
    }

    #[test]
    fn test_full_read() {
        let mut ds2 = driver(Socket::A, full_exchange(b"="));
        ds2.on().unwrap();
        assert_eq!(ds2.read(), Ok(()));
        assert_eq!(ds2.state(), Ds2State::Complete);
        assert_eq!(ds2.checksum(), b'=');
        assert_eq!(ds2.received_checksum(), Some(b'='));

        let mut value = Field::<8>::new();
        ds2.get_wind_speed(&mut value).unwrap();
        assert_eq!(value.as_str(), "+1.23");
        ds2.get_wind_direction(&mut value).unwrap();
        assert_eq!(value.as_str(), "+180");
        ds2.get_temperature(&mut value).unwrap();
        assert_eq!(value.as_str(), "-5.2");
        ds2.get_ubar(&mut value).unwrap();
        assert_eq!(value.as_str(), "+012");
        ds2.get_vbar(&mut value).unwrap();
        assert_eq!(value.as_str(), "-034");
        ds2.get_gust(&mut value).unwrap();
        assert_eq!(value.as_str(), "056");

        let (link, _, delay) = ds2.release();
        assert_eq!(link.sent_strs(), ["0I!", "0M!", "0D0!", "0R3!"]);
        assert_eq!(delay.waits_ms, [300, 30, 5000]);
    }

    #[test]
    fn test_checksum_mismatch_discards_values() {
        // "+012" "-034" "056" sums to 541; 541 % 64 + 32 is '=', not '$'
        let mut ds2 = driver(Socket::A, full_exchange(b"$"));
        ds2.on().unwrap();
        assert_eq!(ds2.read(), Err(Ds2Error::ChecksumFailed));
        assert_eq!(ds2.state(), Ds2State::Failed);
        assert_eq!(ds2.checksum(), b'=');
        assert_eq!(ds2.received_checksum(), Some(b'$'));

        let mut value = Field::<8>::from_str("stale").unwrap();
        ds2.get_ubar(&mut value).unwrap();
        assert!(value.is_empty());
        ds2.get_wind_speed(&mut value).unwrap();
        assert!(value.is_empty());
    }

    #[test]
    fn test_unexpected_measurement_count_skips_data_phase() {
        let link = ScriptedLink::new()
            .answer(&identification(25))
            .answer(b"00052\r\n")
            .answer(b"0+1.23+180-5.2\r\n");
        let mut ds2 = driver(Socket::A, link);
        ds2.on().unwrap();
        assert_eq!(ds2.read(), Err(Ds2Error::UnexpectedMeasurementCount));
        assert_eq!(Ds2Error::UnexpectedMeasurementCount.code(), 6);

        let (link, _, delay) = ds2.release();
        assert_eq!(link.sent_strs(), ["0I!", "0M!"]);
        assert_eq!(delay.waits_ms, [300, 30]);
    }

    #[test]
    fn test_measure_answer_errors() {
        let cases: [(&[u8], Ds2Error); 4] = [
            (&b""[..], Ds2Error::NoMeasureResponse),
            (&b"0x\r\n"[..], Ds2Error::MalformedMeasureResponse),
            (&b"10053\r\n"[..], Ds2Error::MalformedMeasureResponse),
            (&b"00a53\r\n"[..], Ds2Error::MalformedMeasureResponse),
        ];
        for (answer, expected) in cases {
            let link = ScriptedLink::new().answer(&identification(25)).answer(answer);
            let mut ds2 = driver(Socket::A, link);
            ds2.on().unwrap();
            assert_eq!(ds2.read(), Err(expected));
        }
    }

    #[test]
    fn test_data_answer_errors() {
        let link = ScriptedLink::new()
            .answer(&identification(25))
            .answer(b"00003\r\n")
            .answer(b"0\r\n");
        let mut ds2 = driver(Socket::A, link);
        ds2.on().unwrap();
        assert_eq!(ds2.read(), Err(Ds2Error::NoDataParsed));

        let link = ScriptedLink::new()
            .answer(&identification(25))
            .answer(b"00003\r\n");
        let mut ds2 = driver(Socket::A, link);
        ds2.on().unwrap();
        assert_eq!(ds2.read(), Err(Ds2Error::NoDataResponse));
        assert!(Ds2Error::NoDataResponse.is_device_absent());
        assert!(!Ds2Error::NoDataParsed.is_device_absent());
    }

    #[test]
    fn test_missing_extended_answer() {
        let link = ScriptedLink::new()
            .answer(&identification(25))
            .answer(b"00003\r\n")
            .answer(b"0+1+2+3\r\n");
        let mut ds2 = driver(Socket::A, link);
        ds2.on().unwrap();
        assert_eq!(ds2.read(), Err(Ds2Error::NoExtendedResponse));
    }

    #[test]
    fn test_getter_requires_larger_buffer() {
        let mut ds2 = driver(Socket::A, full_exchange(b"="));
        ds2.on().unwrap();
        ds2.read().unwrap();

        // "+180" is 4 bytes; a 4-byte buffer has room for 3
        let mut exact = Field::<4>::from_str("xyz").unwrap();
        assert_eq!(ds2.get_wind_direction(&mut exact), Err(CapacityError));
        assert!(exact.is_empty());

        let mut larger = Field::<5>::new();
        assert!(ds2.get_wind_direction(&mut larger).is_ok());
        assert_eq!(larger.as_str(), "+180");
    }

    #[test]
    fn test_write_record() {
        let mut ds2 = driver(Socket::A, full_exchange(b"="));
        ds2.on().unwrap();
        ds2.read().unwrap();

        let keys = Ds2Keys::default();
        let mut record =
            Record::with_keys(&["ws", "wd", "wtemp", "ubar", "vbar", "gust"]).unwrap();
        ds2.write_record(&mut record, &keys).unwrap();
        assert_eq!(record.get("wd"), Some("+180"));
        assert_eq!(record.get("gust"), Some("056"));

        let mut partial = Record::with_keys(&["ws"]).unwrap();
        assert_eq!(
            ds2.write_record(&mut partial, &keys),
            Err(RecordError::UnknownKey)
        );
    }

    #[test]
    fn test_separator_in_answer_is_not_stored() {
        let link = ScriptedLink::new()
            .answer(&identification(25))
            .answer(b"00003\r\n")
            .answer(b"0+1,2+180-5=2\r\n")
            .answer(b"+012 -034 056=\r\n");
        let mut ds2 = driver(Socket::A, link);
        ds2.on().unwrap();
        ds2.read().unwrap();

        let mut record =
            Record::with_keys(&["ws", "wd", "wtemp", "ubar", "vbar", "gust"]).unwrap();
        record.set("ws", "stale").unwrap();
        assert_eq!(
            ds2.write_record(&mut record, &Ds2Keys::default()),
            Err(RecordError::ReservedCharacter)
        );
        assert_eq!(record.get("ws"), Some(""));
        assert_eq!(record.get("wd"), Some("+180"));
        assert_eq!(record.get("wtemp"), Some(""));
        assert_eq!(record.get("gust"), Some("056"));

        let line = serialize::<LOG_LINE_BUDGET>(&record).unwrap();
        assert_eq!(
            line.as_str(),
            "ws=,wd=+180,wtemp=,ubar=+012,vbar=-034,gust=056;"
        );
        assert_eq!(parse_line(&line), Ok(record));
    }

    #[test]
    fn test_checksum_is_printable_and_deterministic() {
        let printable: std::vec::Vec<u8> = (0x20u8..0x7f).collect();
        for (i, &a) in printable.iter().enumerate() {
            for &b in printable.iter().skip(i % 7).step_by(5) {
                let text = [a, b, a, b, a, b];
                let s = core::str::from_utf8(&text).unwrap();
                let fields = [
                    Ds2Field::from_str(&s[..2]).unwrap(),
                    Ds2Field::from_str(&s[2..6]).unwrap(),
                    Ds2Field::from_str(&s[..1]).unwrap(),
                ];
                let first = checksum(&fields);
                assert!((32..=95).contains(&first));
                assert_eq!(first, checksum(&fields.clone()));
            }
        }
    }

    #[test]
    fn test_checksum_counts_zero_padding_as_nothing() {
        let fields = [
            Ds2Field::from_str("+012").unwrap(),
            Ds2Field::from_str("-034").unwrap(),
            Ds2Field::from_str("056").unwrap(),
        ];
        assert_eq!(checksum(&fields), b'=');
        assert_eq!(checksum::<DS2_FIELD_SIZE>(&[]), b' ');
    }

    #[test]
    fn test_redefined_socket_still_runs() {
        let mut registry = SocketRegistry::new();
        registry.claim(Socket::A);
        let mut ds2 = Ds2::new(
            Socket::A,
            &mut registry,
            ScriptedLink::new().answer(&identification(25)),
            RecordingSocket::default(),
            RecordingDelay::default(),
            Ds2Config::default(),
        );
        assert!(registry.is_redefined(Socket::A));
        assert_eq!(ds2.on(), Ok(()));
    }

    #[test]
    fn test_address_must_be_printable_ascii() {
        let mut registry = SocketRegistry::new();
        for (configured, used) in [('5', '5'), ('é', '0'), (' ', '0')] {
            let config = Ds2Config {
                address: configured,
                ..Ds2Config::default()
            };
            let ds2 = Ds2::new(
                Socket::C,
                &mut registry,
                ScriptedLink::new(),
                RecordingSocket::default(),
                RecordingDelay::default(),
                config,
            );
            assert_eq!(ds2.address(), used);
        }
    }

    #[test]
    fn test_trim_line_end() {
        assert_eq!(trim_line_end(b"abc\r\n"), b"abc");
        assert_eq!(trim_line_end(b"\r\n"), b"");
        assert_eq!(trim_line_end(b""), b"");
    }
}
