use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Context;
use base64::Engine as _;
use image::ImageEncoder as _;

use crate::foundation::core::{CARD_H, CARD_W, RenderScale};
use crate::foundation::error::{CardError, CardResult};
use crate::render::FrameRgba;

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Encoded export bytes. The data URI form is only produced by the fallback encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportPayload {
    Png(Vec<u8>),
    DataUri(String),
}

/// A finished export: PNG bytes plus the filename derived from the character name.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportArtifact {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub scale: RenderScale,
    pub payload: ExportPayload,
}

impl ExportArtifact {
    /// Encode `frame` (premultiplied) as a PNG artifact.
    pub fn encode(frame: &FrameRgba, character_name: &str, scale: RenderScale) -> CardResult<Self> {
        let img = frame.to_rgba_image()?;
        let primary = encode_png_tuned(&img);
        Self::from_encoded(&img, primary, export_filename(character_name, scale), scale)
    }

    fn from_encoded(
        img: &image::RgbaImage,
        primary: CardResult<Vec<u8>>,
        filename: String,
        scale: RenderScale,
    ) -> CardResult<Self> {
        let payload = match primary {
            Ok(bytes) => ExportPayload::Png(bytes),
            Err(error) => {
                tracing::warn!(error = %error, "tuned PNG encoder failed, using default encoder");
                let bytes = encode_png_default(img)?;
                ExportPayload::DataUri(format!(
                    "{DATA_URI_PREFIX}{}",
                    base64::engine::general_purpose::STANDARD.encode(bytes)
                ))
            }
        };
        Ok(Self {
            filename,
            width: img.width(),
            height: img.height(),
            scale,
            payload,
        })
    }

    /// Raw PNG bytes regardless of payload form.
    pub fn png_bytes(&self) -> CardResult<Vec<u8>> {
        match &self.payload {
            ExportPayload::Png(bytes) => Ok(bytes.clone()),
            ExportPayload::DataUri(uri) => {
                let encoded = uri.strip_prefix(DATA_URI_PREFIX).ok_or_else(|| {
                    CardError::encode("export data URI has an unexpected prefix")
                })?;
                base64::engine::general_purpose::STANDARD
                    .decode(encoded)
                    .map_err(|e| CardError::encode(format!("decode export data URI: {e}")))
            }
        }
    }

    /// Write the PNG into `dir` under [`ExportArtifact::filename`].
    pub fn write_to_dir(&self, dir: &Path) -> CardResult<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output dir '{}'", dir.display()))?;
        let path = dir.join(&self.filename);
        let bytes = self.png_bytes()?;
        std::fs::write(&path, bytes).with_context(|| format!("write png '{}'", path.display()))?;
        Ok(path)
    }
}

/// Filename for an export of `character_name`.
///
/// Characters outside `[A-Za-z0-9]` and whitespace are dropped and the words are joined in
/// camel case (`"Hanako Sato"` -> `hanakoSato.png`). Names with nothing usable fall back to
/// `card-frame-290x416@{scale}x.png`.
pub fn export_filename(character_name: &str, scale: RenderScale) -> String {
    let cleaned: String = character_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    let mut words = cleaned.split_whitespace();
    let Some(first) = words.next() else {
        return format!(
            "card-frame-{}x{}@{}x.png",
            CARD_W as u32,
            CARD_H as u32,
            scale.get()
        );
    };

    let mut out = recase_initial(first, false);
    for w in words {
        out.push_str(&recase_initial(w, true));
    }
    out.push_str(".png");
    out
}

fn recase_initial(word: &str, upper: bool) -> String {
    let mut chars = word.chars();
    let Some(c) = chars.next() else {
        return String::new();
    };
    let mut out = String::with_capacity(word.len());
    if upper {
        out.push(c.to_ascii_uppercase());
    } else {
        out.push(c.to_ascii_lowercase());
    }
    out.extend(chars);
    out
}

/// Best-compression PNG with adaptive filtering.
pub fn encode_png_tuned(img: &image::RgbaImage) -> CardResult<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new_with_quality(
        &mut out,
        image::codecs::png::CompressionType::Best,
        image::codecs::png::FilterType::Adaptive,
    );
    encoder
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| CardError::encode(format!("tuned png encode: {e}")))?;
    Ok(out)
}

pub fn encode_png_default(img: &image::RgbaImage) -> CardResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, image::ImageFormat::Png)
        .map_err(|e| CardError::encode(format!("png encode: {e}")))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
#[path = "../tests/unit/export.rs"]
mod tests;
