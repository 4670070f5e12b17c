//! Error types for document loading.

use thiserror::Error;

/// Errors that can occur while loading a TCP document.
///
/// Only parsing is fallible. Segmentation, quotation extraction and span
/// alignment always produce a result (possibly empty).
#[derive(Error, Debug)]
pub enum Error {
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
