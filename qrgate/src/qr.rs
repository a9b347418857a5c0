//! QR encoding and decoding.
//!
//! Both directions delegate to third-party crates: `qrcode` builds the symbol
//! matrix, `rqrr` locates and reads symbols, and `image` handles raster I/O.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};
use tracing::debug;

use crate::error::{Error, Result};

/// File name offered when downloading a generated code.
pub const DOWNLOAD_FILE_NAME: &str = "product_qr.png";

/// MIME type of generated codes.
pub const PNG_MIME: &str = "image/png";

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Visual parameters for generated symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Pixels per module edge
    pub module_scale: u32,
    /// Quiet zone width, in modules
    pub border: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            module_scale: 10,
            border: 5,
        }
    }
}

/// Image formats accepted by the scanner, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Png,
    Jpeg,
}

impl UploadKind {
    /// Classify an uploaded file by its extension (`png`, `jpg`, `jpeg`, any case).
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(UploadKind::Png),
            "jpg" | "jpeg" => Some(UploadKind::Jpeg),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            UploadKind::Png => PNG_MIME,
            UploadKind::Jpeg => "image/jpeg",
        }
    }
}

/// Encode `text` verbatim as a QR symbol and return it as PNG bytes.
///
/// The symbol version is picked automatically to fit the payload. Modules are
/// drawn black on white, `module_scale` pixels wide, inside a white border of
/// `border` modules.
pub fn encode_png(text: &str, options: RenderOptions) -> Result<Vec<u8>> {
    let code = QrCode::new(text.as_bytes()).map_err(|e| Error::QrEncode(e.to_string()))?;
    let width = code.width() as u32;
    let colors = code.to_colors();
    let scale = options.module_scale.max(1);
    let side = (width + 2 * options.border) * scale;

    let symbol = GrayImage::from_fn(side, side, |x, y| {
        let module_x = (x / scale).checked_sub(options.border);
        let module_y = (y / scale).checked_sub(options.border);
        match (module_x, module_y) {
            (Some(mx), Some(my)) if mx < width && my < width => {
                match colors[(my * width + mx) as usize] {
                    Color::Dark => DARK,
                    Color::Light => LIGHT,
                }
            }
            _ => LIGHT,
        }
    });

    let mut png = Vec::new();
    symbol
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(Error::ImageEncode)?;

    debug!(
        "Encoded {} byte payload as {}x{} module symbol ({} byte PNG)",
        text.len(),
        width,
        width,
        png.len()
    );
    Ok(png)
}

/// Find and decode every QR symbol in an image.
///
/// Returns payloads in detection order. An image without symbols yields an
/// empty list; only bytes that cannot be parsed as an image are an error.
pub fn decode(bytes: &[u8]) -> Result<Vec<String>> {
    let gray = image::load_from_memory(bytes)
        .map_err(Error::ImageDecode)?
        .to_luma8();
    let (w, h) = gray.dimensions();

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
        gray.get_pixel(x as u32, y as u32).0[0]
    });
    let grids = prepared.detect_grids();

    let mut payloads = Vec::with_capacity(grids.len());
    for grid in grids {
        match grid.decode() {
            Ok((_meta, content)) => payloads.push(content),
            // A finder pattern without a readable payload is not a result
            Err(e) => debug!("Skipping unreadable QR grid: {:?}", e),
        }
    }

    Ok(payloads)
}

/// MIME type of an image, judged from its leading bytes rather than its name.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type())
}

/// Build an inline `data:` URI so images can be shown without storing them.
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}
