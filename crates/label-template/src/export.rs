//! PDF export
//!
//! One page per record, sized to the template. Painting goes through the
//! shared layout so the PDF matches the preview.

use crate::barcode::{image_dimensions, SymbolGenerator};
use crate::config::{ExportConfig, LabelConfig};
use crate::layout::{fit_image, layout_command, BuiltinMetrics, LayoutItem, SymbolKind, TextMeasure};
use crate::record::{FieldKey, Record};
use crate::renderer::LabelRenderer;
use crate::schema::LabelTemplate;
use crate::units::mm_to_pt;
use crate::{Result, TemplateError};
use chrono::NaiveDateTime;
use label_pdf::{FontFamily, FontFamilyBuilder, FontWeight, PdfDocument};
use std::path::{Path, PathBuf};

/// Directory used by the `*_to_dir` helpers when callers have no preference
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Family name of the embedded fonts
const FONT_FAMILY: &str = "LabelFont";

#[derive(Debug, Clone)]
struct FontSet {
    regular: Vec<u8>,
    bold: Option<Vec<u8>>,
}

impl FontSet {
    fn builder(&self) -> FontFamilyBuilder {
        let builder = FontFamilyBuilder::new().regular(self.regular.clone());
        match &self.bold {
            Some(bold) => builder.bold(bold.clone()),
            None => builder,
        }
    }
}

/// Renders records to PDF
///
/// Without [`with_fonts`](Self::with_fonts) text is set in Helvetica with
/// WinAnsi encoding, so CJK text such as the `出貨標籤` titles of the
/// built-in layouts prints as `?`. Supply a CJK-capable TrueType font to
/// keep it.
pub struct PdfExporter<'a> {
    generator: &'a dyn SymbolGenerator,
    renderer: LabelRenderer,
    config: ExportConfig,
    fonts: Option<FontSet>,
}

impl<'a> PdfExporter<'a> {
    /// Exporter using built-in Helvetica and default settings; CJK text becomes `?`
    pub fn new(generator: &'a dyn SymbolGenerator) -> Self {
        Self {
            generator,
            renderer: LabelRenderer::new(),
            config: ExportConfig::default(),
            fonts: None,
        }
    }

    pub fn with_config(mut self, config: &LabelConfig) -> Self {
        self.renderer = LabelRenderer::with_config(&config.fit);
        self.config = config.export.clone();
        self
    }

    /// Embed a TrueType family; bold falls back to regular when absent
    pub fn with_fonts(mut self, regular: Vec<u8>, bold: Option<Vec<u8>>) -> Self {
        self.fonts = Some(FontSet { regular, bold });
        self
    }

    /// One-page PDF for `record`
    pub fn export_single(&self, template: &LabelTemplate, record: &Record) -> Result<Vec<u8>> {
        self.build(template, std::slice::from_ref(record))
    }

    /// One page per record, in input order
    pub fn export_batch(&self, template: &LabelTemplate, records: &[Record]) -> Result<Vec<u8>> {
        if records.is_empty() {
            return Err(TemplateError::Export(
                "batch export needs at least one record".to_string(),
            ));
        }
        self.build(template, records)
    }

    /// Write a one-page PDF to `path`, creating parent directories
    pub fn export_single_to<P: AsRef<Path>>(
        &self,
        path: P,
        template: &LabelTemplate,
        record: &Record,
    ) -> Result<()> {
        let bytes = self.export_single(template, record)?;
        write_file(path.as_ref(), &bytes)
    }

    /// Write a multi-page PDF to `path`, creating parent directories
    pub fn export_batch_to<P: AsRef<Path>>(
        &self,
        path: P,
        template: &LabelTemplate,
        records: &[Record],
    ) -> Result<()> {
        let bytes = self.export_batch(template, records)?;
        write_file(path.as_ref(), &bytes)
    }

    /// Export into `dir` under [`default_file_name`] for the current time
    pub fn export_single_to_dir<P: AsRef<Path>>(
        &self,
        dir: P,
        template: &LabelTemplate,
        record: &Record,
    ) -> Result<PathBuf> {
        let path = dir.as_ref().join(default_file_name(record, now()));
        self.export_single_to(&path, template, record)?;
        Ok(path)
    }

    /// Export into `dir` under [`batch_file_name`] for the current time
    pub fn export_batch_to_dir<P: AsRef<Path>>(
        &self,
        dir: P,
        template: &LabelTemplate,
        records: &[Record],
    ) -> Result<PathBuf> {
        let path = dir.as_ref().join(batch_file_name(now()));
        self.export_batch_to(&path, template, records)?;
        Ok(path)
    }

    fn build(&self, template: &LabelTemplate, records: &[Record]) -> Result<Vec<u8>> {
        let mut doc = PdfDocument::new();

        // a second parse of the same bytes measures text for the layout
        let family: Option<FontFamily> = match &self.fonts {
            Some(fonts) => {
                doc.register_font_family(FONT_FAMILY, fonts.builder())?;
                Some(fonts.builder().build(FONT_FAMILY)?)
            }
            None => None,
        };
        let measure: &dyn TextMeasure = match &family {
            Some(family) => family,
            None => &BuiltinMetrics,
        };

        for record in records {
            let page = doc.add_page(mm_to_pt(template.size.width), mm_to_pt(template.size.height))?;
            self.paint_label(&mut doc, page, template, record, measure)?;
        }

        log::debug!(
            "exported {} page(s) of {} ({} fonts)",
            records.len(),
            template.code,
            if family.is_some() { "embedded" } else { "built-in" }
        );

        Ok(doc.to_bytes()?)
    }

    fn paint_label(
        &self,
        doc: &mut PdfDocument,
        page: usize,
        template: &LabelTemplate,
        record: &Record,
        measure: &dyn TextMeasure,
    ) -> Result<()> {
        if template.border {
            let line_width = self.config.border_width_pt;
            let (width, height) = doc.page_size(page)?;
            doc.draw_rect(
                page,
                line_width / 2.0,
                line_width / 2.0,
                width - line_width,
                height - line_width,
                line_width,
            )?;
        }

        for command in self.renderer.render(template, record) {
            for item in layout_command(&command, &self.config, measure) {
                match item {
                    LayoutItem::Text(block) => {
                        doc.set_font_size(block.font_size as f32);
                        doc.set_font_weight(if block.bold {
                            FontWeight::Bold
                        } else {
                            FontWeight::Regular
                        });
                        for line in &block.lines {
                            doc.insert_text(
                                &line.text,
                                page,
                                mm_to_pt(line.anchor_x),
                                mm_to_pt(line.baseline_y),
                                block.align.into(),
                            )?;
                        }
                    }
                    LayoutItem::Symbol(symbol) => {
                        let size = symbol.generator_size_mm();
                        let generated = match symbol.kind {
                            SymbolKind::Linear => self.generator.render_linear(&symbol.content, size),
                            SymbolKind::Matrix => self.generator.render_matrix(&symbol.content, size),
                        };
                        let bytes = match generated {
                            Ok(bytes) if !bytes.is_empty() => bytes,
                            Ok(_) => continue,
                            Err(e) => {
                                log::warn!("leaving {} blank on page {page}: {e}", command.field_name);
                                continue;
                            }
                        };

                        let (pixel_width, pixel_height) = image_dimensions(&bytes)?;
                        let placed = fit_image(symbol.bounds, pixel_width, pixel_height);
                        doc.insert_image(
                            &bytes,
                            page,
                            mm_to_pt(placed.x),
                            mm_to_pt(placed.y),
                            mm_to_pt(placed.width),
                            mm_to_pt(placed.height),
                        )?;
                    }
                }
            }
        }

        Ok(())
    }
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    log::debug!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// `Label_{ogb19}_{yyyyMMdd_HHmmss}.pdf`, with `NoId` for a blank `ogb19`
pub fn default_file_name(record: &Record, timestamp: NaiveDateTime) -> String {
    let id = record.raw(FieldKey::Ogb19);
    let id = if id.is_empty() {
        "NoId".to_string()
    } else {
        sanitize_file_name(&id)
    };
    format!("Label_{id}_{}.pdf", timestamp.format("%Y%m%d_%H%M%S"))
}

/// `Labels_Batch_{yyyyMMdd_HHmmss}.pdf`
pub fn batch_file_name(timestamp: NaiveDateTime) -> String {
    format!("Labels_Batch_{}.pdf", timestamp.format("%Y%m%d_%H%M%S"))
}

/// Replace characters that are not allowed in file names
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
