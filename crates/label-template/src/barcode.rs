//! Code 128 and QR code image generation
//!
//! Both symbols are rendered as 8-bit grayscale PNGs at 300 DPI.

use crate::units::mm_to_px300_int;
use crate::{Result, TemplateError};
use barcoders::sym::code128::Code128;
use image::{DynamicImage, GrayImage, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

/// Code 128 character set B start marker understood by barcoders
const CODE128_SET_B: char = '\u{0181}';

/// Blank modules on each side of a linear symbol
const LINEAR_QUIET_ZONE: u32 = 10;

/// Blank modules around a QR symbol
const MATRIX_QUIET_ZONE: u32 = 4;

/// Minimum linear image width in pixels
const LINEAR_MIN_WIDTH: u32 = 200;

/// Linear image width per content character (plus 4 for start/check/stop)
const LINEAR_PX_PER_CHAR: u32 = 11;

const BLACK: Luma<u8> = Luma([0]);
const WHITE: Luma<u8> = Luma([255]);

/// Produces symbol images for label fields
///
/// Empty content gives an empty byte vector.
pub trait SymbolGenerator {
    /// One-dimensional barcode `height_mm` tall
    fn render_linear(&self, content: &str, height_mm: f64) -> Result<Vec<u8>>;

    /// Square two-dimensional code `size_mm` wide
    fn render_matrix(&self, content: &str, size_mm: f64) -> Result<Vec<u8>>;
}

/// Code 128 (set B) and QR (level M) generator
#[derive(Debug, Clone, Copy, Default)]
pub struct BarcodeGenerator;

impl SymbolGenerator for BarcodeGenerator {
    fn render_linear(&self, content: &str, height_mm: f64) -> Result<Vec<u8>> {
        if content.is_empty() {
            return Ok(Vec::new());
        }

        let symbol = Code128::new(format!("{CODE128_SET_B}{content}"))
            .map_err(|e| TemplateError::Barcode(format!("cannot encode {content:?} as Code 128: {e:?}")))?;
        let modules = symbol.encode();

        let total_modules = modules.len() as u32 + 2 * LINEAR_QUIET_ZONE;
        let target_width = LINEAR_MIN_WIDTH
            .max((content.chars().count() as u32 + 4) * LINEAR_PX_PER_CHAR);
        let module_px = (target_width / total_modules).max(1);
        let symbol_px = total_modules * module_px;
        let width = target_width.max(symbol_px);
        let height = mm_to_px300_int(height_mm).max(1);

        let left = (width - symbol_px) / 2 + LINEAR_QUIET_ZONE * module_px;
        let mut img = GrayImage::from_pixel(width, height, WHITE);
        for (index, _) in modules.iter().enumerate().filter(|(_, bar)| **bar == 1) {
            let x0 = left + index as u32 * module_px;
            for x in x0..x0 + module_px {
                for y in 0..height {
                    img.put_pixel(x, y, BLACK);
                }
            }
        }

        encode_png(img)
    }

    fn render_matrix(&self, content: &str, size_mm: f64) -> Result<Vec<u8>> {
        if content.is_empty() {
            return Ok(Vec::new());
        }

        let code = QrCode::with_error_correction_level(content.as_bytes(), EcLevel::M)
            .map_err(|e| TemplateError::Barcode(format!("cannot encode QR payload: {e}")))?;
        let modules = code.width() as u32;
        let colors = code.to_colors();

        let total_modules = modules + 2 * MATRIX_QUIET_ZONE;
        let size = mm_to_px300_int(size_mm).max(total_modules);

        // nearest-module sampling keeps the image exactly `size` square
        let img = GrayImage::from_fn(size, size, |x, y| {
            let mx = (x * total_modules / size) as i64 - MATRIX_QUIET_ZONE as i64;
            let my = (y * total_modules / size) as i64 - MATRIX_QUIET_ZONE as i64;
            let inside = (0..modules as i64).contains(&mx) && (0..modules as i64).contains(&my);
            let dark = inside
                && colors[(my as usize) * modules as usize + mx as usize] == qrcode::Color::Dark;
            if dark {
                BLACK
            } else {
                WHITE
            }
        });

        encode_png(img)
    }
}

/// Pixel size of a generated image
pub(crate) fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let reader = image::ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    Ok(reader.into_dimensions()?)
}

fn encode_png(img: GrayImage) -> Result<Vec<u8>> {
    let mut bytes: Vec<u8> = Vec::new();
    DynamicImage::ImageLuma8(img).write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}
