//! Encoding resolution using `encoding_rs`, with chardetng sniffing for
//! sources whose encoding is not known up front.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::error::{CsvError, Result};

/// Number of bytes inspected by [`sniff_path`].
pub const SNIFF_LEN: usize = 64 * 1024;

/// Resolve a WHATWG encoding label such as `"utf-8"`, `"latin1"` or
/// `"windows-1251"`.
pub fn for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| CsvError::InvalidConfig(format!("unknown encoding label {label:?}")))
}

/// Guess the encoding of a sample.
///
/// A BOM wins, then UTF-8 validity, then chardetng. Pass `complete = false`
/// when the sample is a prefix of a longer source, so a multi-byte sequence
/// cut at the end of the sample is not held against UTF-8.
pub fn detect_encoding(sample: &[u8], complete: bool) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return encoding;
    }

    match simdutf8::compat::from_utf8(sample) {
        Ok(_) => return UTF_8,
        Err(e) if !complete && e.error_len().is_none() => return UTF_8,
        Err(_) => {}
    }

    let mut detector = EncodingDetector::new();
    detector.feed(sample, complete);
    detector.guess(None, true)
}

/// Sniff the encoding of a file from its first [`SNIFF_LEN`] bytes.
pub fn sniff_path<P: AsRef<Path>>(path: P) -> Result<&'static Encoding> {
    let file = File::open(path.as_ref())?;
    let mut sample = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64 + 1).read_to_end(&mut sample)?;

    let complete = sample.len() <= SNIFF_LEN;
    sample.truncate(SNIFF_LEN);

    let encoding = detect_encoding(&sample, complete);
    debug!(
        "sniffed {} as {} from {} bytes",
        path.as_ref().display(),
        encoding.name(),
        sample.len()
    );
    Ok(encoding)
}
