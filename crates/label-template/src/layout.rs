//! Shared label geometry
//!
//! [`layout_command`] turns a [`RenderCommand`] into boxes and text lines in
//! millimetres (origin top-left). The PDF exporter and the preview both
//! paint from these items only, converting to their own units at the last
//! step, so the two outputs cannot drift apart.

use crate::command::{CommandKind, RenderCommand};
use crate::config::ExportConfig;
use crate::schema::Align;
use crate::units::pt_to_mm;
use label_pdf::{calculate_scaled_dimensions, BuiltinFont, FontFamily, FontWeight, ImageScaleMode};
use label_text::{clamp_lines, estimate_width_mm, WidthModel};

/// Em-box ascent used to place baselines
const ASCENT: f64 = 0.8;

/// Width tolerance when checking whether a line fits, in mm
const FIT_EPSILON: f64 = 1e-6;

/// Axis-aligned rectangle, origin top-left
///
/// Millimetres in the layout; the preview reuses it for logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One line of laid out text
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Left edge, centre or right edge depending on the block alignment
    pub anchor_x: f64,
    /// Baseline, from the top of the label
    pub baseline_y: f64,
}

/// Text block in a field box
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
    /// Points
    pub font_size: f64,
    pub bold: bool,
    pub align: Align,
    pub bounds: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Code 128
    Linear,
    /// QR code
    Matrix,
}

/// Area reserved for a generated symbol image
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolBox {
    pub kind: SymbolKind,
    pub content: String,
    pub bounds: Rect,
}

impl SymbolBox {
    /// Physical size passed to the symbol generator
    pub fn generator_size_mm(&self) -> f64 {
        match self.kind {
            SymbolKind::Linear => self.bounds.height,
            SymbolKind::Matrix => self.bounds.width.min(self.bounds.height),
        }
    }
}

/// Renderer-agnostic paint item
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutItem {
    Text(TextBlock),
    Symbol(SymbolBox),
}

/// Text width measurement in millimetres
pub trait TextMeasure {
    fn width_mm(&self, text: &str, font_size: f64, bold: bool) -> f64;
}

/// Metrics of the built-in Helvetica pair
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinMetrics;

impl TextMeasure for BuiltinMetrics {
    fn width_mm(&self, text: &str, font_size: f64, bold: bool) -> f64 {
        let font = BuiltinFont::for_weight(weight(bold));
        pt_to_mm(font.text_width_points(text, font_size as f32) as f64)
    }
}

/// The render engine's CJK-aware estimate
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedMetrics(pub WidthModel);

impl TextMeasure for EstimatedMetrics {
    fn width_mm(&self, text: &str, font_size: f64, _bold: bool) -> f64 {
        estimate_width_mm(text, font_size, self.0.char_width_factor)
    }
}

/// Real metrics of an embedded TrueType family
impl TextMeasure for FontFamily {
    fn width_mm(&self, text: &str, font_size: f64, bold: bool) -> f64 {
        let points = self.variant(weight(bold)).text_width_points(text, font_size as f32);
        pt_to_mm(points as f64)
    }
}

fn weight(bold: bool) -> FontWeight {
    if bold {
        FontWeight::Bold
    } else {
        FontWeight::Regular
    }
}

/// Lay out one command; skipped commands and empty text produce nothing
pub fn layout_command(
    command: &RenderCommand,
    config: &ExportConfig,
    measure: &dyn TextMeasure,
) -> Vec<LayoutItem> {
    if command.skip {
        return Vec::new();
    }

    let bounds = Rect {
        x: command.position.x,
        y: command.position.y,
        width: command.size.width,
        height: command.size.height,
    };

    match &command.kind {
        CommandKind::Text(run) => {
            let max_lines = if run.requires_wrap { 2 } else { 1 };
            layout_text(
                &command.content,
                bounds,
                run.actual_font_size,
                run.bold,
                run.align,
                max_lines,
                config,
                measure,
            )
            .map(LayoutItem::Text)
            .into_iter()
            .collect()
        }
        CommandKind::Barcode => {
            let caption_height = config.caption_height_mm.min(bounds.height).max(0.0);
            let symbol = Rect {
                height: bounds.height - caption_height,
                ..bounds
            };
            let caption_bounds = Rect {
                y: bounds.y + symbol.height,
                height: caption_height,
                ..bounds
            };

            let mut items = vec![LayoutItem::Symbol(SymbolBox {
                kind: SymbolKind::Linear,
                content: command.content.clone(),
                bounds: symbol,
            })];
            if let Some(caption) = layout_text(
                &command.content,
                caption_bounds,
                config.caption_font_size,
                false,
                Align::Center,
                1,
                config,
                measure,
            ) {
                items.push(LayoutItem::Text(caption));
            }
            items
        }
        CommandKind::QrCode => {
            let side = bounds.width.min(bounds.height);
            vec![LayoutItem::Symbol(SymbolBox {
                kind: SymbolKind::Matrix,
                content: command.content.clone(),
                bounds: Rect {
                    width: side,
                    height: side,
                    ..bounds
                },
            })]
        }
    }
}

/// Lines vertically centred in `bounds`, clamped to `max_lines`
#[allow(clippy::too_many_arguments)]
fn layout_text(
    content: &str,
    bounds: Rect,
    font_size: f64,
    bold: bool,
    align: Align,
    max_lines: usize,
    config: &ExportConfig,
    measure: &dyn TextMeasure,
) -> Option<TextBlock> {
    if content.is_empty() {
        return None;
    }

    let fits = |line: &str| measure.width_mm(line, font_size, bold) <= bounds.width + FIT_EPSILON;
    let lines = clamp_lines(content, max_lines, &config.ellipsis, fits);

    let em = pt_to_mm(font_size);
    let line_height = em * config.line_height_factor;
    let top = bounds.y + (bounds.height - line_height * lines.len() as f64) / 2.0;
    let anchor_x = match align {
        Align::Left => bounds.x,
        Align::Center => bounds.x + bounds.width / 2.0,
        Align::Right => bounds.x + bounds.width,
    };

    let lines = lines
        .into_iter()
        .enumerate()
        .map(|(index, text)| {
            let line_top = top + index as f64 * line_height;
            TextLine {
                text,
                anchor_x,
                baseline_y: line_top + (line_height - em) / 2.0 + em * ASCENT,
            }
        })
        .collect();

    Some(TextBlock {
        lines,
        font_size,
        bold,
        align,
        bounds,
    })
}

/// Where an image of `pixel_width` x `pixel_height` lands inside `bounds`
///
/// The image keeps its aspect ratio, fills as much of the box as it can and
/// sits in the top-left corner.
pub fn fit_image(bounds: Rect, pixel_width: u32, pixel_height: u32) -> Rect {
    let (width, height) = calculate_scaled_dimensions(
        pixel_width,
        pixel_height,
        bounds.width,
        bounds.height,
        ImageScaleMode::FitBox,
    );
    Rect { width, height, ..bounds }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::TextRun;
    use crate::schema::{Position, Size};
    use pretty_assertions::assert_eq;

    fn command(kind: CommandKind, content: &str, x: f64, y: f64, w: f64, h: f64) -> RenderCommand {
        RenderCommand {
            field_name: "F".into(),
            kind,
            content: content.into(),
            position: Position { x, y },
            size: Size { width: w, height: h },
            skip: false,
        }
    }

    fn run(size: f64, align: Align, requires_wrap: bool) -> CommandKind {
        CommandKind::Text(TextRun {
            font_size: size,
            actual_font_size: size,
            bold: false,
            align,
            requires_wrap,
        })
    }

    fn text_block(items: &[LayoutItem]) -> &TextBlock {
        match &items[0] {
            LayoutItem::Text(block) => block,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_skipped_command_has_no_items() {
        let mut cmd = command(CommandKind::Barcode, "", 5.0, 29.0, 60.0, 10.0);
        cmd.skip = true;
        assert!(layout_command(&cmd, &ExportConfig::default(), &BuiltinMetrics).is_empty());
    }

    #[test]
    fn test_empty_text_has_no_items() {
        let cmd = command(run(11.0, Align::Left, false), "", 5.0, 10.0, 20.0, 5.0);
        assert!(layout_command(&cmd, &ExportConfig::default(), &BuiltinMetrics).is_empty());
    }

    #[test]
    fn test_text_is_vertically_centred() {
        // 10pt with 1.2 line pitch is 4.2333mm per line
        let cmd = command(run(10.0, Align::Left, false), "Q'ty", 55.0, 19.0, 10.0, 4.0);
        let items = layout_command(&cmd, &ExportConfig::default(), &BuiltinMetrics);
        let block = text_block(&items);

        assert_eq!(block.lines.len(), 1);
        let em = pt_to_mm(10.0);
        let line_height = em * 1.2;
        let top = 19.0 + (4.0 - line_height) / 2.0;
        let expected = top + (line_height - em) / 2.0 + em * 0.8;
        assert!((block.lines[0].baseline_y - expected).abs() < 1e-9);
        assert_eq!(block.lines[0].anchor_x, 55.0);
    }

    #[test]
    fn test_alignment_anchors() {
        let config = ExportConfig::default();
        let center = command(run(14.0, Align::Center, false), "Shipping", 5.0, 2.0, 90.0, 6.0);
        let right = command(run(14.0, Align::Right, false), "Shipping", 5.0, 2.0, 90.0, 6.0);
        assert_eq!(text_block(&layout_command(&center, &config, &BuiltinMetrics)).lines[0].anchor_x, 50.0);
        assert_eq!(text_block(&layout_command(&right, &config, &BuiltinMetrics)).lines[0].anchor_x, 95.0);
    }

    #[test]
    fn test_explicit_newlines_make_two_lines() {
        let cmd = command(run(9.0, Align::Left, false), "Customer\nName", 5.0, 10.0, 20.0, 8.0);
        let items = layout_command(&cmd, &ExportConfig::default(), &BuiltinMetrics);
        let block = text_block(&items);
        let texts: Vec<&str> = block.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Customer", "Name"]);
        assert!(block.lines[1].baseline_y > block.lines[0].baseline_y);
    }

    #[test]
    fn test_overflow_is_clamped_with_ellipsis() {
        let content = "A very long customer name that cannot fit";
        let single = command(run(10.0, Align::Left, false), content, 0.0, 0.0, 20.0, 5.0);
        let items = layout_command(&single, &ExportConfig::default(), &BuiltinMetrics);
        let block = text_block(&items);
        assert_eq!(block.lines.len(), 1);
        assert!(block.lines[0].text.ends_with("..."));
        assert!(BuiltinMetrics.width_mm(&block.lines[0].text, 10.0, false) <= 20.0 + FIT_EPSILON);

        let wrapped = command(run(10.0, Align::Left, true), content, 0.0, 0.0, 20.0, 8.0);
        let items = layout_command(&wrapped, &ExportConfig::default(), &BuiltinMetrics);
        assert_eq!(text_block(&items).lines.len(), 2);
    }

    #[test]
    fn test_barcode_reserves_caption_strip() {
        let cmd = command(CommandKind::Barcode, "4D010018", 5.0, 29.0, 60.0, 10.0);
        let items = layout_command(&cmd, &ExportConfig::default(), &BuiltinMetrics);
        assert_eq!(items.len(), 2);

        match &items[0] {
            LayoutItem::Symbol(symbol) => {
                assert_eq!(symbol.kind, SymbolKind::Linear);
                assert_eq!(symbol.bounds, Rect { x: 5.0, y: 29.0, width: 60.0, height: 7.0 });
                assert_eq!(symbol.generator_size_mm(), 7.0);
            }
            other => panic!("expected symbol, got {other:?}"),
        }
        match &items[1] {
            LayoutItem::Text(caption) => {
                assert_eq!(caption.font_size, 8.0);
                assert_eq!(caption.align, Align::Center);
                assert_eq!(caption.bounds.y, 36.0);
                assert_eq!(caption.lines[0].text, "4D010018");
                assert_eq!(caption.lines[0].anchor_x, 35.0);
            }
            other => panic!("expected caption, got {other:?}"),
        }
    }

    #[test]
    fn test_qrcode_is_square_at_origin() {
        let cmd = command(CommandKind::QrCode, "A;;C", 75.0, 40.0, 20.0, 18.0);
        let items = layout_command(&cmd, &ExportConfig::default(), &BuiltinMetrics);
        match &items[0] {
            LayoutItem::Symbol(symbol) => {
                assert_eq!(symbol.bounds, Rect { x: 75.0, y: 40.0, width: 18.0, height: 18.0 });
                assert_eq!(symbol.generator_size_mm(), 18.0);
            }
            other => panic!("expected symbol, got {other:?}"),
        }
    }

    #[test]
    fn test_fit_image() {
        let bounds = Rect { x: 5.0, y: 29.0, width: 64.0, height: 8.0 };
        let placed = fit_image(bounds, 256, 128);
        assert_eq!(placed.height, 8.0);
        assert_eq!(placed.width, 16.0);
        assert_eq!((placed.x, placed.y), (5.0, 29.0));

        let wide = fit_image(bounds, 1024, 8);
        assert_eq!(wide.width, 64.0);
        assert_eq!(wide.height, 0.5);
        assert_eq!(fit_image(bounds, 0, 10), bounds);
    }

    #[test]
    fn test_estimated_metrics() {
        let metrics = EstimatedMetrics(WidthModel::default());
        assert!((metrics.width_mm("客戶", 10.0, false) - 0.7).abs() < 1e-12);
        assert!((metrics.width_mm("ab", 10.0, true) - 0.35).abs() < 1e-12);
    }
}
