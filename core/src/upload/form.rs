//! Key-value POST of a single record
//!
//! The record goes out as a form body (`key=value&key=value`) to
//! `/dweet/for/<thing>`.

use core::fmt::Write;

use heapless::String;
use probe_hal::{PostRequest, Uploader};

use crate::config::{DweetConfig, LOG_LINE_BUDGET};
use crate::field::CapacityError;
use crate::record::Record;
use crate::serializer::{serialize_with, RecordFormat};
use crate::upload::UploadError;

/// Resource prefix of the collection endpoint
pub const DWEET_PREFIX: &str = "/dweet/for/";

/// Size of the resource buffer
pub const RESOURCE_SIZE: usize = 48;

/// `/dweet/for/<thing>`
pub fn dweet_resource(thing: &str) -> Result<String<RESOURCE_SIZE>, CapacityError> {
    if thing.is_empty() || DWEET_PREFIX.len() + thing.len() >= RESOURCE_SIZE {
        return Err(CapacityError);
    }
    let mut resource = String::new();
    write!(resource, "{}{}", DWEET_PREFIX, thing).map_err(|_| CapacityError)?;
    Ok(resource)
}

/// Send `record` as a form POST
pub fn post_record<U: Uploader>(
    uploader: &mut U,
    config: &DweetConfig,
    record: &Record,
) -> Result<(), UploadError> {
    let resource = dweet_resource(config.thing).map_err(|_| UploadError::Capacity)?;
    let body = serialize_with::<LOG_LINE_BUDGET>(record, RecordFormat::FORM)
        .map_err(|_| UploadError::Capacity)?;

    let request = PostRequest {
        host: config.host,
        port: config.port,
        resource: &resource,
        body: &body,
    };
    match uploader.post(&request) {
        Ok(()) => {
            info!(
                "posted {} bytes to {}{}",
                body.len(),
                config.host,
                resource.as_str()
            );
            Ok(())
        }
        Err(_) => {
            warn!("post to {} failed", config.host);
            Err(UploadError::Transport)
        }
    }
}
