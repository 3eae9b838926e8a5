//! Progress photo checks and downscaling.
//!
//! Photos are validated by declared MIME type and size, fitted into an
//! 800x600 box and re-encoded as JPEG data URLs before they are attached to
//! a progress record.

use std::io::Cursor;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use thiserror::Error;

pub const MAX_PHOTO_BYTES: u64 = 5 * 1024 * 1024;
pub const MAX_PHOTOS: usize = 10;
pub const ALLOWED_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];
pub const BOX_WIDTH: u32 = 800;
pub const BOX_HEIGHT: u32 = 600;
pub const JPEG_QUALITY: u8 = 80;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
  #[error("{count} arquivo(s) muito grande(s). Tamanho máximo: 5MB")]
  TooLarge { count: usize },
  #[error("{count} arquivo(s) com formato inválido. Use: JPEG, PNG, GIF ou WebP")]
  UnsupportedType { count: usize },
  #[error("Limite máximo de 10 fotos. Você tem {current} e está tentando adicionar {adding}")]
  TooMany { current: usize, adding: usize },
  #[error("Erro ao ler arquivo: {0}")]
  Io(String),
  #[error("Erro ao processar arquivo: {0}")]
  Decode(String),
  #[error("Erro ao converter imagem: {0}")]
  Encode(String),
}

/// A file picked from disk, with the MIME type guessed from its extension.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoFile {
  pub name: String,
  pub mime: String,
  pub bytes: Vec<u8>,
}

impl PhotoFile {
  pub fn read(path: &Path) -> Result<Self, ImageError> {
    let bytes = std::fs::read(path).map_err(|e| ImageError::Io(e.to_string()))?;
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    let mime = mime_for_path(path).unwrap_or("application/octet-stream");

    Ok(Self {
      name,
      mime: mime.to_string(),
      bytes,
    })
  }

  pub fn size(&self) -> u64 {
    self.bytes.len() as u64
  }
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
  let ext = path.extension()?.to_str()?.to_ascii_lowercase();
  match ext.as_str() {
    "jpg" | "jpeg" => Some("image/jpeg"),
    "png" => Some("image/png"),
    "gif" => Some("image/gif"),
    "webp" => Some("image/webp"),
    _ => None,
  }
}

pub fn validate_photo(mime: &str, size: u64) -> Result<(), ImageError> {
  if size > MAX_PHOTO_BYTES {
    return Err(ImageError::TooLarge { count: 1 });
  }
  if !ALLOWED_TYPES.contains(&mime) {
    return Err(ImageError::UnsupportedType { count: 1 });
  }
  Ok(())
}

/// Check a batch: every oversized file is reported first, then every
/// file of the wrong type.
pub fn validate_photos(files: &[PhotoFile]) -> Result<(), ImageError> {
  let too_large = files.iter().filter(|f| f.size() > MAX_PHOTO_BYTES).count();
  if too_large > 0 {
    return Err(ImageError::TooLarge { count: too_large });
  }

  let wrong_type = files
    .iter()
    .filter(|f| !ALLOWED_TYPES.contains(&f.mime.as_str()))
    .count();
  if wrong_type > 0 {
    return Err(ImageError::UnsupportedType { count: wrong_type });
  }
  Ok(())
}

pub fn check_photo_limit(current: usize, adding: usize) -> Result<(), ImageError> {
  if current + adding > MAX_PHOTOS {
    return Err(ImageError::TooMany { current, adding });
  }
  Ok(())
}

/// Target size inside `max_width` x `max_height`.
///
/// Landscape images are capped by width, everything else by height. The
/// aspect ratio is kept and images are never enlarged.
pub fn fit_box(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
  let (w, h) = (width as f64, height as f64);
  let (w, h) = if width > height {
    if width > max_width {
      (max_width as f64, h * max_width as f64 / w)
    } else {
      (w, h)
    }
  } else if height > max_height {
    (w * max_height as f64 / h, max_height as f64)
  } else {
    (w, h)
  };

  ((w.floor() as u32).max(1), (h.floor() as u32).max(1))
}

pub fn resize_to_box(bytes: &[u8], max_width: u32, max_height: u32) -> Result<DynamicImage, ImageError> {
  let img = image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;
  let (width, height) = fit_box(img.width(), img.height(), max_width, max_height);
  if (width, height) == (img.width(), img.height()) {
    return Ok(img);
  }
  Ok(img.resize_exact(width, height, FilterType::Triangle))
}

/// `data:image/jpeg;base64,...` at [`JPEG_QUALITY`]
pub fn encode_data_url(img: &DynamicImage) -> Result<String, ImageError> {
  let rgb = img.to_rgb8();
  let mut buf = Cursor::new(Vec::new());
  JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
    .encode_image(&rgb)
    .map_err(|e| ImageError::Encode(e.to_string()))?;

  Ok(format!(
    "data:image/jpeg;base64,{}",
    STANDARD.encode(buf.into_inner())
  ))
}

/// Validate, downscale and encode one photo for a progress record.
pub fn prepare_photo(file: &PhotoFile) -> Result<String, ImageError> {
  validate_photo(&file.mime, file.size())?;
  let img = resize_to_box(&file.bytes, BOX_WIDTH, BOX_HEIGHT)?;
  encode_data_url(&img)
}
