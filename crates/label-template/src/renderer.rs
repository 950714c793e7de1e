//! Label render engine
//!
//! Turns a template and a record into one [`RenderCommand`] per field.
//! Rendering never fails: missing data resolves to empty content and the
//! skip rules decide what gets painted.

use crate::command::{CommandKind, RenderCommand, TextRun};
use crate::config::FitConfig;
use crate::record::Record;
use crate::schema::{Field, LabelTemplate, Source};
use label_text::{fit_font_size, WidthModel};

/// QR payload delimiter
const COMBINE_DELIMITER: char = ';';

/// Template renderer
#[derive(Debug, Clone, Default)]
pub struct LabelRenderer {
    width_model: WidthModel,
}

impl LabelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer using a custom width estimate
    pub fn with_config(config: &FitConfig) -> Self {
        Self {
            width_model: config.width_model(),
        }
    }

    /// Render commands in field order
    pub fn render(&self, template: &LabelTemplate, record: &Record) -> Vec<RenderCommand> {
        let commands: Vec<RenderCommand> = template
            .fields
            .iter()
            .map(|field| self.render_field(field, record))
            .collect();

        log::debug!(
            "rendered {} with {} command(s), {} skipped",
            template.code,
            commands.len(),
            commands.iter().filter(|c| c.skip).count()
        );

        commands
    }

    fn render_field(&self, field: &Field, record: &Record) -> RenderCommand {
        let content = resolve_content(field, record);
        let position = field.position();
        let size = field.size();

        let (kind, skip) = match field {
            Field::Text(text) => {
                let fit = if text.auto_shrink {
                    fit_font_size(
                        &content,
                        size.width,
                        text.font.size,
                        text.min_font_size,
                        &self.width_model,
                    )
                } else {
                    label_text::FontFit {
                        size: text.font.size,
                        requires_wrap: false,
                    }
                };
                let run = TextRun {
                    font_size: text.font.size,
                    actual_font_size: fit.size,
                    bold: text.font.bold,
                    align: text.align,
                    requires_wrap: fit.requires_wrap,
                };
                (CommandKind::Text(run), false)
            }
            Field::Barcode(_) => (CommandKind::Barcode, content.trim().is_empty()),
            Field::QrCode(_) => {
                // literals of a combine pattern never count as payload
                let empty = match field.source() {
                    Source::Combine(pattern) => pattern
                        .placeholders()
                        .all(|key| record.raw_value(key).trim().is_empty()),
                    _ => content.replace(COMBINE_DELIMITER, "").trim().is_empty(),
                };
                (CommandKind::QrCode, empty)
            }
        };

        RenderCommand {
            field_name: field.name().to_string(),
            kind,
            content,
            position,
            size,
            skip,
        }
    }

    /// Friendly labels of barcode fields whose bound value is blank
    pub fn missing_required_fields(&self, template: &LabelTemplate, record: &Record) -> Vec<String> {
        template
            .fields
            .iter()
            .filter_map(|field| match (field, field.source()) {
                (Field::Barcode(_), Source::Bind(key)) if record.raw_value(key).is_empty() => {
                    Some(field.display_label().to_string())
                }
                _ => None,
            })
            .collect()
    }
}

/// Content of one field before any skip decision
pub(crate) fn resolve_content(field: &Field, record: &Record) -> String {
    let content = match field.source() {
        Source::Constant(text) => text.to_string(),
        Source::Combine(pattern) => pattern.resolve(|key| record.raw_value(key)),
        Source::Bind("") => String::new(),
        Source::Bind(key) => match field {
            Field::Text(text) if text.use_display => record.display_value(key),
            _ => record.raw_value(key),
        },
    };

    match field {
        Field::Text(text) => match text.format_type {
            Some(format) => format.apply(&content),
            None => content,
        },
        _ => content,
    }
}
