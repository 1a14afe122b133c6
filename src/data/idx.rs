//! IDX binary files as used by MNIST and its derivatives (Fashion-MNIST,
//! EMNIST, …).
//!
//! # IDX3 image file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x03        (number of dimensions = 3)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (image height in pixels, big-endian u32)
//! bytes 12-15:  cols        (image width in pixels, big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # IDX1 label file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x01        (number of dimensions = 1)
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a class index
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{Error, Result};

/// Decoded IDX3 image block.
#[derive(Debug, Clone, PartialEq)]
pub struct IdxImages {
    pub count: usize,
    pub rows: usize,
    pub cols: usize,
    /// `count * rows * cols` raw pixels.
    pub pixels: Vec<u8>,
}

/// Reads a whole IDX file, gunzipping it when the name ends in `.gz`.
pub fn read_idx_file(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path)
        .map_err(|e| Error::dataset(format!("cannot open {}: {e}", path.display())))?;
    let mut bytes = Vec::new();
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        GzDecoder::new(file).read_to_end(&mut bytes)?;
    } else {
        let mut file = file;
        file.read_to_end(&mut bytes)?;
    }
    debug!(path = %path.display(), bytes = bytes.len(), "read idx file");
    Ok(bytes)
}

fn check_header(bytes: &[u8], kind: &str, dims: u8, header_len: usize) -> Result<()> {
    if bytes.len() < header_len {
        return Err(Error::dataset(format!(
            "IDX {kind} file too short: expected at least {header_len} header bytes, got {}",
            bytes.len()
        )));
    }
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(Error::dataset(format!(
            "IDX {kind} file: bytes 0-1 must be 0x00 0x00 (reserved), got 0x{:02X} 0x{:02X}",
            bytes[0], bytes[1]
        )));
    }
    if bytes[2] != 0x08 {
        return Err(Error::dataset(format!(
            "IDX {kind} file: byte 2 (dtype) must be 0x08 (uint8), got 0x{:02X}",
            bytes[2]
        )));
    }
    if bytes[3] != dims {
        return Err(Error::dataset(format!(
            "IDX {kind} file: byte 3 (dimensions) must be {dims}, got {}",
            bytes[3]
        )));
    }
    Ok(())
}

fn be_u32(bytes: &[u8], offset: usize) -> usize {
    u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]]) as usize
}

/// Parses an IDX3 image file.
pub fn parse_idx_images(bytes: &[u8]) -> Result<IdxImages> {
    check_header(bytes, "image", 0x03, 16)?;

    let count = be_u32(bytes, 4);
    let rows = be_u32(bytes, 8);
    let cols = be_u32(bytes, 12);

    let n_pixels = rows.checked_mul(cols).ok_or_else(|| {
        Error::dataset(format!("IDX image file: rows * cols overflows (rows={rows}, cols={cols})"))
    })?;
    let data_len = count.checked_mul(n_pixels).ok_or_else(|| {
        Error::dataset(format!(
            "IDX image file: count * pixels overflows (count={count}, pixels={n_pixels})"
        ))
    })?;

    if bytes.len() < 16 + data_len {
        return Err(Error::dataset(format!(
            "IDX image file too short: header declares {count} images of {rows}x{cols} pixels \
             ({data_len} data bytes), but file is only {} bytes",
            bytes.len()
        )));
    }

    Ok(IdxImages {
        count,
        rows,
        cols,
        pixels: bytes[16..16 + data_len].to_vec(),
    })
}

/// Parses an IDX1 label file.
pub fn parse_idx_labels(bytes: &[u8]) -> Result<Vec<u8>> {
    check_header(bytes, "label", 0x01, 8)?;

    let count = be_u32(bytes, 4);
    if bytes.len() < 8 + count {
        return Err(Error::dataset(format!(
            "IDX label file too short: header declares {count} labels but file is only {} bytes",
            bytes.len()
        )));
    }
    Ok(bytes[8..8 + count].to_vec())
}
