//! Remote collection endpoint
//!
//! The cellular modem offers two transports: a key-value HTTP POST and a
//! whole-file transfer. Implementations power the modem for the duration of
//! each call and leave it off afterwards.

/// A form POST to the collection endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostRequest<'a> {
    /// Host name, e.g. `dweet.io`
    pub host: &'a str,
    /// TCP port, usually 80
    pub port: u16,
    /// Path-prefixed resource, e.g. `/dweet/for/probe`
    pub resource: &'a str,
    /// `&`-joined `key=value` pairs
    pub body: &'a str,
}

/// Port for uploading data over the cellular link
pub trait Uploader {
    /// Transport failure reported by the modem
    type Error: core::fmt::Debug;

    /// Send a key-value POST
    fn post(&mut self, request: &PostRequest<'_>) -> Result<(), Self::Error>;

    /// Transfer the local file `local_name` to `remote_path` on the server
    fn upload_file(&mut self, local_name: &str, remote_path: &str) -> Result<(), Self::Error>;
}
