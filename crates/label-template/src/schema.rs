//! Label template schema types
//!
//! Geometry is in millimetres with the origin at the top-left corner of
//! the label.

use crate::parser::CombinePattern;
use crate::record::FieldKey;
use crate::{Result, TemplateError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A shipping label layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelTemplate {
    /// Lookup code, e.g. "QW075551-1"
    pub code: String,

    /// Human-readable name
    pub name: String,

    /// Page size
    pub size: Size,

    /// Stroke a rectangle around the label
    #[serde(default)]
    pub border: bool,

    /// Fields in painting order
    pub fields: Vec<Field>,
}

/// Position in millimetres from the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Size in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Label field (tagged union)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Field {
    /// Text field
    Text(TextField),

    /// Code 128 barcode
    Barcode(BarcodeField),

    /// QR code
    #[serde(rename = "qrcode")]
    QrCode(QrCodeField),
}

/// Font settings of a text field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Font {
    /// Nominal font size in points
    #[serde(default = "default_font_size")]
    pub size: f64,

    #[serde(default)]
    pub bold: bool,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            size: default_font_size(),
            bold: false,
        }
    }
}

fn default_font_size() -> f64 {
    10.0
}

fn default_min_font_size() -> f64 {
    6.0
}

/// Text alignment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl From<Align> for label_pdf::Align {
    fn from(align: Align) -> Self {
        match align {
            Align::Left => label_pdf::Align::Left,
            Align::Center => label_pdf::Align::Center,
            Align::Right => label_pdf::Align::Right,
        }
    }
}

/// Post-processing applied to resolved text
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FormatType {
    /// `yyyy-MM-dd` to `yyyy/MM/dd`
    SlashDate,
}

impl FormatType {
    pub fn apply(&self, text: &str) -> String {
        match self {
            FormatType::SlashDate => label_text::format_slash_date(text),
        }
    }
}

/// Text field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextField {
    /// Field name, unique within the template
    pub name: String,

    /// Friendly name for messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Record column to bind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    /// Constant text (used instead of `bind`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    pub position: Position,

    pub size: Size,

    /// Use the display value instead of the raw value
    #[serde(rename = "useDisplay")]
    #[serde(default)]
    pub use_display: bool,

    #[serde(default)]
    pub font: Font,

    #[serde(default)]
    pub align: Align,

    /// Shrink the font until the text fits the field width
    #[serde(rename = "autoShrink")]
    #[serde(default)]
    pub auto_shrink: bool,

    /// Lower bound for `autoShrink`, in points
    #[serde(rename = "minFontSize")]
    #[serde(default = "default_min_font_size")]
    pub min_font_size: f64,

    #[serde(rename = "formatType")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_type: Option<FormatType>,
}

/// Code 128 barcode field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BarcodeField {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    pub position: Position,

    pub size: Size,
}

/// QR code field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QrCodeField {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Payload built from several columns, e.g. `{pono};{ima902}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combine: Option<CombinePattern>,

    pub position: Position,

    pub size: Size,
}

/// Where a field's content comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Source<'a> {
    /// Literal text, the record is ignored
    Constant(&'a str),
    /// Record column; an empty key resolves to empty content
    Bind(&'a str),
    Combine(&'a CombinePattern),
}

fn source_of<'a>(
    text: &'a Option<String>,
    bind: &'a Option<String>,
    combine: Option<&'a CombinePattern>,
) -> Source<'a> {
    if let Some(text) = text {
        Source::Constant(text)
    } else if let Some(pattern) = combine {
        Source::Combine(pattern)
    } else {
        Source::Bind(bind.as_deref().unwrap_or_default())
    }
}

impl Field {
    pub fn name(&self) -> &str {
        match self {
            Field::Text(f) => &f.name,
            Field::Barcode(f) => &f.name,
            Field::QrCode(f) => &f.name,
        }
    }

    /// Friendly label, falling back to the field name
    pub fn display_label(&self) -> &str {
        let label = match self {
            Field::Text(f) => f.label.as_deref(),
            Field::Barcode(f) => f.label.as_deref(),
            Field::QrCode(f) => f.label.as_deref(),
        };
        label.unwrap_or_else(|| self.name())
    }

    pub fn position(&self) -> Position {
        match self {
            Field::Text(f) => f.position,
            Field::Barcode(f) => f.position,
            Field::QrCode(f) => f.position,
        }
    }

    pub fn size(&self) -> Size {
        match self {
            Field::Text(f) => f.size,
            Field::Barcode(f) => f.size,
            Field::QrCode(f) => f.size,
        }
    }

    /// Content source; `text` wins over `combine`, which wins over `bind`
    pub fn source(&self) -> Source<'_> {
        match self {
            Field::Text(f) => source_of(&f.text, &f.bind, None),
            Field::Barcode(f) => source_of(&f.text, &f.bind, None),
            Field::QrCode(f) => source_of(&f.text, &f.bind, f.combine.as_ref()),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.source(), Source::Constant(_))
    }

    fn source_count(&self) -> usize {
        let (text, bind, combine) = match self {
            Field::Text(f) => (&f.text, &f.bind, false),
            Field::Barcode(f) => (&f.text, &f.bind, false),
            Field::QrCode(f) => (&f.text, &f.bind, f.combine.is_some()),
        };
        text.is_some() as usize + bind.is_some() as usize + combine as usize
    }
}

impl LabelTemplate {
    /// Parse and validate a template from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let template = crate::parser::parse_template(json)?;
        template.validate()?;
        Ok(template)
    }

    /// Field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Check geometry and data-source invariants
    ///
    /// Unknown record columns are only warned about: they resolve to empty
    /// content at render time.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(TemplateError::ValidationError(format!("{}: {msg}", self.code)));

        if self.code.trim().is_empty() {
            return Err(TemplateError::ValidationError("template code is empty".to_string()));
        }
        if !(self.size.width > 0.0 && self.size.height > 0.0) {
            return fail(format!(
                "label size must be positive, got {} x {} mm",
                self.size.width, self.size.height
            ));
        }

        let mut names = HashSet::new();
        for field in &self.fields {
            let name = field.name();
            if name.trim().is_empty() {
                return fail("field with empty name".to_string());
            }
            if !names.insert(name) {
                return fail(format!("duplicate field name {name}"));
            }

            let (position, size) = (field.position(), field.size());
            if !(position.x >= 0.0 && position.y >= 0.0) {
                return fail(format!("field {name} has a negative position"));
            }
            if !(size.width >= 0.0 && size.height >= 0.0) {
                return fail(format!("field {name} has a negative size"));
            }
            if position.x + size.width > self.size.width || position.y + size.height > self.size.height {
                log::warn!("{}: field {name} extends past the label edge", self.code);
            }

            if field.source_count() != 1 {
                return fail(format!(
                    "field {name} needs exactly one of text, bind or combine"
                ));
            }

            match field.source() {
                Source::Bind(key) if FieldKey::parse(key).is_none() => {
                    log::warn!("{}: field {name} binds unknown column {key:?}", self.code);
                }
                Source::Combine(pattern) => {
                    for key in pattern.placeholders() {
                        if FieldKey::parse(key).is_none() {
                            log::warn!("{}: field {name} combines unknown column {key:?}", self.code);
                        }
                    }
                }
                _ => {}
            }

            if let Field::Text(text) = field {
                if !(text.font.size > 0.0 && text.min_font_size > 0.0) {
                    return fail(format!("field {name} needs positive font sizes"));
                }
                if text.min_font_size > text.font.size {
                    return fail(format!(
                        "field {name} has minFontSize {} above font size {}",
                        text.min_font_size, text.font.size
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_with(field_json: &str) -> String {
        format!(
            r#"{{
                "code": "T-1",
                "name": "test",
                "size": {{ "width": 100, "height": 60 }},
                "fields": [{field_json}]
            }}"#
        )
    }

    #[test]
    fn test_parse_text_field_defaults() {
        let json = r#"{
            "type": "text",
            "name": "CSQTY",
            "bind": "ogd09",
            "useDisplay": true,
            "position": { "x": 66, "y": 19 },
            "size": { "width": 29, "height": 5 }
        }"#;

        let field: Field = serde_json::from_str(json).unwrap();
        match &field {
            Field::Text(f) => {
                assert!(f.use_display);
                assert_eq!(f.font, Font { size: 10.0, bold: false });
                assert_eq!(f.min_font_size, 6.0);
                assert_eq!(f.align, Align::Left);
                assert!(!f.auto_shrink);
                assert_eq!(f.format_type, None);
            }
            _ => panic!("Expected TextField"),
        }
        assert_eq!(field.source(), Source::Bind("ogd09"));
        assert_eq!(field.display_label(), "CSQTY");
    }

    #[test]
    fn test_parse_qrcode_combine() {
        let json = r#"{
            "type": "qrcode",
            "name": "QRCODE",
            "combine": "{cscustpo};{erpmat};{ogd09}",
            "position": { "x": 75, "y": 40 },
            "size": { "width": 20, "height": 20 }
        }"#;

        let field: Field = serde_json::from_str(json).unwrap();
        match field.source() {
            Source::Combine(pattern) => {
                assert_eq!(pattern.placeholders().collect::<Vec<_>>(), vec!["cscustpo", "erpmat", "ogd09"]);
            }
            other => panic!("Expected combine source, got {other:?}"),
        }
    }

    #[test]
    fn test_combine_rejected_on_text_field() {
        let json = r#"{
            "type": "text",
            "name": "Bad",
            "combine": "{pono}",
            "position": { "x": 0, "y": 0 },
            "size": { "width": 10, "height": 5 }
        }"#;
        assert!(serde_json::from_str::<Field>(json).is_err());
    }

    #[test]
    fn test_unknown_field_type_rejected() {
        let json = r#"{ "type": "datamatrix", "name": "X",
            "position": { "x": 0, "y": 0 }, "size": { "width": 1, "height": 1 } }"#;
        assert!(serde_json::from_str::<Field>(json).is_err());
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        let json = template_with(
            r#"{ "type": "barcode", "name": "ERPPARTNO", "label": "ERP 料號 (erpmat)", "bind": "erpmat",
                 "position": { "x": 5, "y": 29 }, "size": { "width": 60, "height": 10 } }"#,
        );
        let template = LabelTemplate::from_json(&json).unwrap();
        assert_eq!(template.fields[0].display_label(), "ERP 料號 (erpmat)");
        assert!(!template.border);
    }

    #[test]
    fn test_validate_rejects_two_sources() {
        let json = template_with(
            r#"{ "type": "text", "name": "A", "text": "x", "bind": "pono",
                 "position": { "x": 0, "y": 0 }, "size": { "width": 10, "height": 5 } }"#,
        );
        assert!(matches!(
            LabelTemplate::from_json(&json),
            Err(TemplateError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_missing_source() {
        let json = template_with(
            r#"{ "type": "barcode", "name": "A",
                 "position": { "x": 0, "y": 0 }, "size": { "width": 10, "height": 5 } }"#,
        );
        assert!(LabelTemplate::from_json(&json).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_geometry() {
        let json = template_with(
            r#"{ "type": "text", "name": "A", "text": "x",
                 "position": { "x": -1, "y": 0 }, "size": { "width": 10, "height": 5 } }"#,
        );
        assert!(LabelTemplate::from_json(&json).is_err());

        let json = template_with(
            r#"{ "type": "text", "name": "A", "text": "x",
                 "position": { "x": 1, "y": 0 }, "size": { "width": -10, "height": 5 } }"#,
        );
        assert!(LabelTemplate::from_json(&json).is_err());
    }

    #[test]
    fn test_validate_rejects_min_font_above_nominal() {
        let json = template_with(
            r#"{ "type": "text", "name": "A", "bind": "pono", "font": { "size": 8 }, "minFontSize": 9,
                 "position": { "x": 0, "y": 0 }, "size": { "width": 10, "height": 5 } }"#,
        );
        assert!(LabelTemplate::from_json(&json).is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let field = r#"{ "type": "text", "name": "A", "text": "x",
                 "position": { "x": 0, "y": 0 }, "size": { "width": 10, "height": 5 } }"#;
        let json = template_with(&format!("{field}, {field}"));
        assert!(LabelTemplate::from_json(&json).is_err());
    }

    #[test]
    fn test_format_type() {
        assert_eq!(FormatType::SlashDate.apply("2025-11-14"), "2025/11/14");
        assert_eq!(FormatType::SlashDate.apply("invalid-date-format"), "invalid-date-format");
        let parsed: FormatType = serde_json::from_str(r#""slash-date""#).unwrap();
        assert_eq!(parsed, FormatType::SlashDate);
    }
}
