//! On-screen preview
//!
//! [`PreviewRenderer`] converts the shared layout into a [`PreviewCanvas`]
//! measured in 96 DPI logical units. A host UI can draw the elements itself
//! or ask the canvas for a bitmap with [`PreviewCanvas::rasterize`].

use crate::barcode::{image_dimensions, SymbolGenerator};
use crate::command::RenderCommand;
use crate::config::{ExportConfig, LabelConfig};
use crate::layout::{fit_image, layout_command, BuiltinMetrics, LayoutItem, Rect, SymbolKind, TextMeasure};
use crate::schema::{Align, LabelTemplate};
use crate::units::{mm_to_logical, pt_to_logical};
use crate::Result;
use ab_glyph::{point, Font, FontRef, PxScale, ScaleFont};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// One text line in logical units
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewLine {
    pub text: String,
    /// Left edge, centre or right edge depending on the alignment
    pub x: f64,
    pub baseline: f64,
}

/// Paint element; all coordinates are logical units from the top-left
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewElement {
    /// Label outline, centred on `rect`'s edges
    Border { rect: Rect, stroke: f64 },
    Text {
        lines: Vec<PreviewLine>,
        font_size: f64,
        bold: bool,
        align: Align,
    },
    /// Generated symbol image, already fitted
    Image { rect: Rect, png: Vec<u8> },
}

/// Label preview in logical units
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewCanvas {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<PreviewElement>,
}

/// Builds preview canvases from render commands
pub struct PreviewRenderer<'a> {
    generator: &'a dyn SymbolGenerator,
    measure: &'a dyn TextMeasure,
    config: ExportConfig,
}

impl<'a> PreviewRenderer<'a> {
    /// Preview measuring text with the built-in Helvetica metrics
    pub fn new(generator: &'a dyn SymbolGenerator) -> Self {
        Self {
            generator,
            measure: &BuiltinMetrics,
            config: ExportConfig::default(),
        }
    }

    pub fn with_config(mut self, config: &LabelConfig) -> Self {
        self.config = config.export.clone();
        self
    }

    /// Measure text with the font the host will draw with
    pub fn with_measure(mut self, measure: &'a dyn TextMeasure) -> Self {
        self.measure = measure;
        self
    }

    /// Canvas for one rendered label
    pub fn render(&self, template: &LabelTemplate, commands: &[RenderCommand]) -> Result<PreviewCanvas> {
        let mut elements = Vec::new();

        if template.border {
            let stroke = pt_to_logical(self.config.border_width_pt);
            let (width, height) = (mm_to_logical(template.size.width), mm_to_logical(template.size.height));
            elements.push(PreviewElement::Border {
                rect: Rect {
                    x: stroke / 2.0,
                    y: stroke / 2.0,
                    width: width - stroke,
                    height: height - stroke,
                },
                stroke,
            });
        }

        for command in commands {
            for item in layout_command(command, &self.config, self.measure) {
                match item {
                    LayoutItem::Text(block) => elements.push(PreviewElement::Text {
                        lines: block
                            .lines
                            .into_iter()
                            .map(|line| PreviewLine {
                                text: line.text,
                                x: mm_to_logical(line.anchor_x),
                                baseline: mm_to_logical(line.baseline_y),
                            })
                            .collect(),
                        font_size: pt_to_logical(block.font_size),
                        bold: block.bold,
                        align: block.align,
                    }),
                    LayoutItem::Symbol(symbol) => {
                        let size = symbol.generator_size_mm();
                        let generated = match symbol.kind {
                            SymbolKind::Linear => self.generator.render_linear(&symbol.content, size),
                            SymbolKind::Matrix => self.generator.render_matrix(&symbol.content, size),
                        };
                        let png = match generated {
                            Ok(png) if !png.is_empty() => png,
                            Ok(_) => continue,
                            Err(e) => {
                                log::warn!("preview leaves {} blank: {e}", command.field_name);
                                continue;
                            }
                        };

                        let (pixel_width, pixel_height) = image_dimensions(&png)?;
                        let placed = fit_image(symbol.bounds, pixel_width, pixel_height);
                        elements.push(PreviewElement::Image {
                            rect: to_logical(placed),
                            png,
                        });
                    }
                }
            }
        }

        Ok(PreviewCanvas {
            width: mm_to_logical(template.size.width),
            height: mm_to_logical(template.size.height),
            elements,
        })
    }
}

fn to_logical(rect: Rect) -> Rect {
    Rect {
        x: mm_to_logical(rect.x),
        y: mm_to_logical(rect.y),
        width: mm_to_logical(rect.width),
        height: mm_to_logical(rect.height),
    }
}

impl PreviewCanvas {
    /// Paint into an RGBA bitmap, `scale` device pixels per logical unit
    ///
    /// Text needs a font; without one only borders and images are drawn.
    pub fn rasterize(&self, scale: f64, font: Option<&FontRef<'_>>) -> Result<RgbaImage> {
        let width = ((self.width * scale).ceil() as u32).max(1);
        let height = ((self.height * scale).ceil() as u32).max(1);
        let mut canvas = RgbaImage::from_pixel(width, height, WHITE);

        for element in &self.elements {
            match element {
                PreviewElement::Border { rect, stroke } => {
                    let thickness = ((stroke * scale).round() as u32).max(1);
                    let outer = Rect {
                        x: rect.x - stroke / 2.0,
                        y: rect.y - stroke / 2.0,
                        width: rect.width + stroke,
                        height: rect.height + stroke,
                    };
                    stroke_rect(&mut canvas, scaled(outer, scale), thickness);
                }
                PreviewElement::Image { rect, png } => {
                    let target = scaled(*rect, scale);
                    let (w, h) = (target.width.round() as u32, target.height.round() as u32);
                    if w == 0 || h == 0 {
                        continue;
                    }
                    let decoded = image::load_from_memory(png)?.to_rgba8();
                    let resized = imageops::resize(&decoded, w, h, FilterType::Nearest);
                    imageops::overlay(&mut canvas, &resized, target.x.round() as i64, target.y.round() as i64);
                }
                PreviewElement::Text {
                    lines,
                    font_size,
                    bold,
                    align,
                } => {
                    if let Some(font) = font {
                        let px = PxScale::from((font_size * scale) as f32);
                        for line in lines {
                            draw_line(&mut canvas, font, px, line, *align, *bold, scale);
                        }
                    }
                }
            }
        }

        Ok(canvas)
    }
}

fn scaled(rect: Rect, scale: f64) -> Rect {
    Rect {
        x: rect.x * scale,
        y: rect.y * scale,
        width: rect.width * scale,
        height: rect.height * scale,
    }
}

/// Outline drawn inward from `rect`
fn stroke_rect(canvas: &mut RgbaImage, rect: Rect, thickness: u32) {
    let x0 = rect.x.round().max(0.0) as u32;
    let y0 = rect.y.round().max(0.0) as u32;
    let x1 = ((rect.x + rect.width).round().max(0.0) as u32).min(canvas.width());
    let y1 = ((rect.y + rect.height).round().max(0.0) as u32).min(canvas.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let edge = x < x0 + thickness
                || y < y0 + thickness
                || x + thickness >= x1
                || y + thickness >= y1;
            if edge {
                canvas.put_pixel(x, y, BLACK);
            }
        }
    }
}

fn draw_line(
    canvas: &mut RgbaImage,
    font: &FontRef<'_>,
    px: PxScale,
    line: &PreviewLine,
    align: Align,
    bold: bool,
    scale: f64,
) {
    let scaled_font = font.as_scaled(px);
    let glyphs: Vec<_> = line.text.chars().map(|c| scaled_font.glyph_id(c)).collect();

    let mut advance = 0.0f32;
    let mut offsets = Vec::with_capacity(glyphs.len());
    for (index, id) in glyphs.iter().enumerate() {
        if index > 0 {
            advance += scaled_font.kern(glyphs[index - 1], *id);
        }
        offsets.push(advance);
        advance += scaled_font.h_advance(*id);
    }

    let anchor = (line.x * scale) as f32;
    let start_x = match align {
        Align::Left => anchor,
        Align::Center => anchor - advance / 2.0,
        Align::Right => anchor - advance,
    };
    let baseline = (line.baseline * scale) as f32;

    // faux bold: second pass shifted by a fraction of the em
    let passes = if bold { vec![0.0, px.x / 24.0] } else { vec![0.0] };
    let (width, height) = (canvas.width() as i64, canvas.height() as i64);

    for shift in passes {
        for (id, offset) in glyphs.iter().zip(&offsets) {
            let glyph = id.with_scale_and_position(px, point(start_x + offset + shift, baseline));
            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i64 + gx as i64;
                let y = bounds.min.y as i64 + gy as i64;
                if x < 0 || y < 0 || x >= width || y >= height {
                    return;
                }
                let pixel = canvas.get_pixel_mut(x as u32, y as u32);
                let keep = 1.0 - coverage.clamp(0.0, 1.0);
                for channel in pixel.0.iter_mut().take(3) {
                    *channel = (*channel as f32 * keep).round() as u8;
                }
            });
        }
    }
}
