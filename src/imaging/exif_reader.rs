//! EXIF extraction with `kamadak-exif`.
//!
//! Reads the primary IFD of JPEG, PNG (eXIf), TIFF, HEIF and WebP containers.
//! Values are copied out unvalidated into [`RawExif`].
//!
//! Re-encoding a JPEG loses its APP1 segment, so the raw block can also be
//! lifted out of a source file ([`read_exif_block`]) and spliced back into
//! freshly encoded bytes ([`insert_exif_segment`]).

use super::backend::{BackendError, RawExif};
use exif::{Exif, In, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read the EXIF block of `path`.
///
/// Returns `Ok(None)` when the file has no EXIF block or the container is not
/// one the reader understands. I/O and malformed-block errors are returned.
pub fn read_raw_exif(path: &Path) -> Result<Option<RawExif>, BackendError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(
            exif::Error::NotFound(_) | exif::Error::NotSupported(_) | exif::Error::BlankValue(_),
        ) => return Ok(None),
        Err(exif::Error::Io(e)) => return Err(BackendError::Io(e)),
        Err(e) => {
            return Err(BackendError::ProcessingFailed(format!(
                "Failed to read EXIF from {}: {e}",
                path.display()
            )));
        }
    };

    Ok(Some(RawExif {
        date_time_original: ascii(&exif, Tag::DateTimeOriginal),
        f_number: rational(&exif, Tag::FNumber),
        focal_length: rational(&exif, Tag::FocalLength),
        iso: exif
            .get_field(Tag::PhotographicSensitivity, In::PRIMARY)
            .and_then(|f| f.value.get_uint(0))
            .map(f64::from),
        exposure_time: rational(&exif, Tag::ExposureTime),
        model: ascii(&exif, Tag::Model),
        lens_model: ascii(&exif, Tag::LensModel),
    }))
}

/// The raw TIFF-structured EXIF block of `path`, if it has a readable one.
pub fn read_exif_block(path: &Path) -> Option<Vec<u8>> {
    let file = File::open(path).ok()?;
    let exif = exif::Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .ok()?;
    Some(exif.buf().to_vec())
}

/// Largest TIFF block that fits one APP1 segment (length field, `Exif\0\0`).
const MAX_APP1_PAYLOAD: usize = u16::MAX as usize - 2 - 6;

/// Insert `tiff` as an APP1 EXIF segment right after the SOI marker of
/// `jpeg`.
///
/// Returns `None` when `jpeg` does not start with SOI or the block is too
/// large for a single segment.
pub fn insert_exif_segment(jpeg: &[u8], tiff: &[u8]) -> Option<Vec<u8>> {
    if !jpeg.starts_with(&[0xFF, 0xD8]) || tiff.len() > MAX_APP1_PAYLOAD {
        return None;
    }
    let segment_len = u16::try_from(2 + 6 + tiff.len()).ok()?;

    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[2..]);
    Some(out)
}

fn rational(exif: &Exif, tag: Tag) -> Option<f64> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(v) => v.first().map(|r| r.to_f64()),
        Value::SRational(v) => v.first().map(|r| r.to_f64()),
        _ => None,
    }
}

fn ascii(exif: &Exif, tag: Tag) -> Option<String> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(parts) => parts.first().map(|bytes| {
            String::from_utf8_lossy(bytes)
                .trim_end_matches('\0')
                .trim()
                .to_string()
        }),
        _ => None,
    }
}
