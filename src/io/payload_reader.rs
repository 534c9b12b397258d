//! Reading the raw webhook body
//!
//! The body is an `application/x-www-form-urlencoded` document, taken from a
//! file when one is given and from stdin otherwise.

use crate::types::Payload;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Read and decode a webhook body
///
/// # Arguments
///
/// * `source` - File holding the body, or `None` for stdin
///
/// # Errors
///
/// Returns the underlying I/O error if the body cannot be read.
pub fn read_payload(source: Option<&Path>) -> io::Result<Payload> {
    let body = match source {
        Some(path) => fs::read(path)?,
        None => {
            let mut body = Vec::new();
            io::stdin().lock().read_to_end(&mut body)?;
            body
        }
    };
    Ok(Payload::from_form(body.trim_ascii_end()))
}
