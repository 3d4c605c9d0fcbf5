//! Test doubles for the capability traits

use std::collections::{BTreeMap, VecDeque};
use std::string::{String, ToString};
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_io::{ErrorKind, ErrorType, Read, Seek, SeekFrom, Write};
use probe_hal::{
    Clock, LinkState, OpenMode, PostRequest, SensorSocket, SerialLink, Storage, StorageFile,
    Uploader,
};

/// Serial link that answers each command with the next scripted reply
#[derive(Debug, Default)]
pub struct ScriptedLink {
    answers: VecDeque<Vec<u8>>,
    rx: VecDeque<u8>,
    pub sent: Vec<Vec<u8>>,
    pub listens: Vec<(usize, u32)>,
    pub states: Vec<LinkState>,
}

impl ScriptedLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, bytes: &[u8]) -> Self {
        self.answers.push_back(bytes.to_vec());
        self
    }

    pub fn sent_strs(&self) -> Vec<String> {
        self.sent
            .iter()
            .map(|cmd| String::from_utf8_lossy(cmd).into_owned())
            .collect()
    }
}

impl SerialLink for ScriptedLink {
    fn send_command(&mut self, command: &[u8]) {
        self.sent.push(command.to_vec());
    }

    fn read_command_answer(&mut self, expected_len: usize, timeout_ms: u32) {
        self.listens.push((expected_len, timeout_ms));
        if let Some(answer) = self.answers.pop_front() {
            self.rx.extend(answer);
        }
    }

    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn set_state(&mut self, state: LinkState) {
        self.states.push(state);
    }
}

/// Socket that records every rail and mux operation
#[derive(Debug, Default)]
pub struct RecordingSocket {
    pub events: Vec<&'static str>,
}

impl SensorSocket for RecordingSocket {
    fn power_on(&mut self) {
        self.events.push("power_on");
    }

    fn power_off(&mut self) {
        self.events.push("power_off");
    }

    fn set_12v(&mut self, on: bool) {
        self.events.push(if on { "12v_on" } else { "12v_off" });
    }

    fn select_mux(&mut self) {
        self.events.push("select_mux");
    }

    fn release_mux(&mut self) {
        self.events.push("release_mux");
    }
}

/// Delay that returns at once and records what was asked for, in ms
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub waits_ms: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waits_ms.push(ns / 1_000_000);
    }

    fn delay_us(&mut self, us: u32) {
        self.waits_ms.push(us / 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.waits_ms.push(ms);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemError {
    PowerOn,
    NotPowered,
    Missing,
    Injected,
    ReadOnly,
}

impl core::fmt::Display for MemError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl core::error::Error for MemError {}

impl embedded_io::Error for MemError {
    fn kind(&self) -> ErrorKind {
        match self {
            MemError::Missing => ErrorKind::NotFound,
            _ => ErrorKind::Other,
        }
    }
}

/// Failure switches for [`MemStorage`]
#[derive(Debug, Default, Clone, Copy)]
pub struct Faults {
    pub power_on: bool,
    pub create: bool,
    pub read: bool,
    pub write: bool,
    pub close: bool,
}

/// In-memory medium with power tracking and failure injection
#[derive(Debug, Default)]
pub struct MemStorage {
    pub files: BTreeMap<String, Vec<u8>>,
    pub powered: bool,
    pub power_ons: usize,
    pub faults: Faults,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: &str, contents: &str) -> Self {
        self.files
            .insert(name.to_string(), contents.as_bytes().to_vec());
        self
    }

    pub fn contents(&self, name: &str) -> Option<&str> {
        self.files
            .get(name)
            .and_then(|bytes| core::str::from_utf8(bytes).ok())
    }
}

pub struct MemFile<'a> {
    data: &'a mut Vec<u8>,
    pos: usize,
    mode: OpenMode,
    faults: Faults,
}

impl ErrorType for MemFile<'_> {
    type Error = MemError;
}

impl Read for MemFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, MemError> {
        if self.faults.read {
            return Err(MemError::Injected);
        }
        let start = self.pos.min(self.data.len());
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos = start + n;
        Ok(n)
    }
}

impl Write for MemFile<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, MemError> {
        if self.mode == OpenMode::Read {
            return Err(MemError::ReadOnly);
        }
        if self.faults.write {
            return Err(MemError::Injected);
        }
        if self.mode == OpenMode::Append {
            self.pos = self.data.len();
        }
        for &byte in buf {
            if self.pos < self.data.len() {
                self.data[self.pos] = byte;
            } else {
                self.data.push(byte);
            }
            self.pos += 1;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), MemError> {
        Ok(())
    }
}

impl Seek for MemFile<'_> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, MemError> {
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(offset) => self.data.len() as i64 + offset,
            SeekFrom::Current(offset) => self.pos as i64 + offset,
        };
        self.pos = target.max(0) as usize;
        Ok(self.pos as u64)
    }
}

impl StorageFile for MemFile<'_> {
    fn close(self) -> Result<(), MemError> {
        if self.faults.close {
            return Err(MemError::Injected);
        }
        Ok(())
    }
}

impl Storage for MemStorage {
    type Error = MemError;
    type File<'a> = MemFile<'a>;

    fn power_on(&mut self) -> Result<(), MemError> {
        if self.faults.power_on {
            return Err(MemError::PowerOn);
        }
        self.powered = true;
        self.power_ons += 1;
        Ok(())
    }

    fn power_off(&mut self) {
        self.powered = false;
    }

    fn exists(&mut self, name: &str) -> Result<bool, MemError> {
        if !self.powered {
            return Err(MemError::NotPowered);
        }
        Ok(self.files.contains_key(name))
    }

    fn create(&mut self, name: &str) -> Result<(), MemError> {
        if !self.powered {
            return Err(MemError::NotPowered);
        }
        if self.faults.create {
            return Err(MemError::Injected);
        }
        self.files.entry(name.to_string()).or_default();
        Ok(())
    }

    fn open(&mut self, name: &str, mode: OpenMode) -> Result<MemFile<'_>, MemError> {
        if !self.powered {
            return Err(MemError::NotPowered);
        }
        let faults = self.faults;
        let data = self.files.get_mut(name).ok_or(MemError::Missing)?;
        Ok(MemFile {
            data,
            pos: 0,
            mode,
            faults,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportDown;

/// Uploader that records requests and fails for chosen files
#[derive(Debug, Default)]
pub struct ScriptedUploader {
    pub uploads: Vec<(String, String)>,
    pub posts: Vec<(String, u16, String, String)>,
    pub failing: Vec<String>,
    pub post_fails: bool,
}

impl ScriptedUploader {
    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|name| name.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl Uploader for ScriptedUploader {
    type Error = TransportDown;

    fn post(&mut self, request: &PostRequest<'_>) -> Result<(), TransportDown> {
        if self.post_fails {
            return Err(TransportDown);
        }
        self.posts.push((
            request.host.to_string(),
            request.port,
            request.resource.to_string(),
            request.body.to_string(),
        ));
        Ok(())
    }

    fn upload_file(&mut self, local_name: &str, remote_path: &str) -> Result<(), TransportDown> {
        if self.failing.iter().any(|name| name == local_name) {
            return Err(TransportDown);
        }
        self.uploads
            .push((local_name.to_string(), remote_path.to_string()));
        Ok(())
    }
}

/// Clock whose millisecond counter advances by `step_ms` on every read
#[derive(Debug, Default)]
pub struct SteppingClock {
    pub unix: u64,
    pub now_ms: u64,
    pub step_ms: u64,
}

impl SteppingClock {
    pub fn new(step_ms: u64) -> Self {
        Self {
            step_ms,
            ..Self::default()
        }
    }
}

impl Clock for SteppingClock {
    fn unix_secs(&mut self) -> u64 {
        self.unix
    }

    fn uptime_ms(&mut self) -> u64 {
        let now = self.now_ms;
        self.now_ms += self.step_ms;
        now
    }
}
