//! In-place conversion of images to 1-bit grayscale PNG.
//!
//! Needs the `onebit` cargo feature. Without it [`convert_png_to_1bit`]
//! reports [`OneBitError::Unavailable`] and [`AVAILABLE`] is false.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Whether this build can convert images.
pub const AVAILABLE: bool = cfg!(feature = "onebit");

/// Luma values at or above this become white.
pub const THRESHOLD: u8 = 128;

#[derive(Debug, Error)]
pub enum OneBitError {
    #[error("1-bit conversion is not compiled into this build")]
    Unavailable,

    #[error("image file not found: {0}")]
    Missing(PathBuf),

    #[error("cannot decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("cannot encode {path}: {message}")]
    Encode { path: PathBuf, message: String },
}

impl OneBitError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable => "onebit_unavailable",
            Self::Missing(_) => "file_missing",
            Self::Decode { .. } => "decode_failed",
            Self::Encode { .. } => "encode_failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Converted,
    AlreadyBilevel,
}

/// True when `path` is a PNG whose header declares 1-bit grayscale.
#[cfg(feature = "onebit")]
pub fn is_bilevel(path: &Path) -> bool {
    let Ok(file) = std::fs::File::open(path) else {
        return false;
    };
    let decoder = png::Decoder::new(std::io::BufReader::new(file));
    match decoder.read_info() {
        Ok(reader) => {
            let info = reader.info();
            info.bit_depth == png::BitDepth::One && info.color_type == png::ColorType::Grayscale
        }
        Err(_) => false,
    }
}

#[cfg(not(feature = "onebit"))]
pub fn is_bilevel(_path: &Path) -> bool {
    false
}

/// Threshold the image at `path` and rewrite it as a 1-bit PNG.
///
/// Files that are already bilevel are left alone unless `force` is set.
/// The new file is written next to the original and renamed over it.
#[cfg(feature = "onebit")]
pub fn convert_png_to_1bit(path: &Path, force: bool) -> Result<Outcome, OneBitError> {
    use std::fs;
    use std::io::BufWriter;

    if !path.is_file() {
        return Err(OneBitError::Missing(path.to_path_buf()));
    }
    if !force && is_bilevel(path) {
        return Ok(Outcome::AlreadyBilevel);
    }

    let decode_err = |message: String| OneBitError::Decode {
        path: path.to_path_buf(),
        message,
    };
    let encode_err = |message: String| OneBitError::Encode {
        path: path.to_path_buf(),
        message,
    };

    let luma = image::ImageReader::open(path)
        .map_err(|e| decode_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_err(e.to_string()))?
        .decode()
        .map_err(|e| decode_err(e.to_string()))?
        .to_luma8();
    let (width, height) = luma.dimensions();
    let packed = pack_bits(luma.as_raw(), width as usize);

    let tmp = path.with_extension("png.tmp");
    let written = (|| -> Result<(), String> {
        let file = fs::File::create(&tmp).map_err(|e| e.to_string())?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::One);
        let mut writer = encoder.write_header().map_err(|e| e.to_string())?;
        writer.write_image_data(&packed).map_err(|e| e.to_string())?;
        writer.finish().map_err(|e| e.to_string())
    })();

    if let Err(message) = written {
        let _ = fs::remove_file(&tmp);
        return Err(encode_err(message));
    }
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        encode_err(e.to_string())
    })?;
    Ok(Outcome::Converted)
}

#[cfg(not(feature = "onebit"))]
pub fn convert_png_to_1bit(_path: &Path, _force: bool) -> Result<Outcome, OneBitError> {
    Err(OneBitError::Unavailable)
}

/// Pack 8-bit luma rows into MSB-first 1-bit rows; set bits are white.
#[cfg_attr(not(feature = "onebit"), allow(dead_code))]
fn pack_bits(luma: &[u8], width: usize) -> Vec<u8> {
    if width == 0 {
        return Vec::new();
    }
    let row_bytes = width.div_ceil(8);
    let rows = luma.len() / width;
    let mut out = vec![0u8; row_bytes * rows];
    for (y, row) in luma.chunks_exact(width).enumerate() {
        for (x, &v) in row.iter().enumerate() {
            if v >= THRESHOLD {
                out[y * row_bytes + x / 8] |= 0x80 >> (x % 8);
            }
        }
    }
    out
}

/// Convert every PNG directly inside each sub-directory of `root`.
/// Returns `(converted, skipped, failures)`.
pub fn convert_tree(root: &Path) -> std::io::Result<(usize, usize, Vec<(PathBuf, OneBitError)>)> {
    let mut converted = 0;
    let mut skipped = 0;
    let mut failures = Vec::new();

    for entry in std::fs::read_dir(root)? {
        let sub = entry?.path();
        if !sub.is_dir() {
            continue;
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(&sub)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
            })
            .collect();
        files.sort();

        for file in files {
            match convert_png_to_1bit(&file, false) {
                Ok(Outcome::Converted) => converted += 1,
                Ok(Outcome::AlreadyBilevel) => skipped += 1,
                Err(e) => failures.push((file, e)),
            }
        }
    }
    Ok((converted, skipped, failures))
}
