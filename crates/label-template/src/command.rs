//! Render commands: the resolved, renderer-agnostic form of a label

use crate::schema::{Align, Position, Size};
use crate::{Result, TemplateError};
use serde::{Deserialize, Serialize};

/// Version of the serialized [`CommandBatch`] shape
pub const COMMAND_FORMAT_VERSION: u32 = 1;

/// One resolved field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderCommand {
    /// Name of the template field this command was built from
    #[serde(rename = "fieldName")]
    pub field_name: String,

    pub kind: CommandKind,

    /// Resolved text or symbol payload
    pub content: String,

    /// Millimetres from the top-left corner
    pub position: Position,

    /// Millimetres
    pub size: Size,

    /// Do not paint (text fields are never skipped)
    pub skip: bool,
}

/// Command kind with kind-specific styling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CommandKind {
    Text(TextRun),
    Barcode,
    #[serde(rename = "qrcode")]
    QrCode,
}

/// Text styling after font fitting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Nominal size from the template, in points
    #[serde(rename = "fontSize")]
    pub font_size: f64,

    /// Size to render with, in points
    #[serde(rename = "actualFontSize")]
    pub actual_font_size: f64,

    pub bold: bool,

    pub align: Align,

    /// Still too wide at the minimum size; allow a second line
    #[serde(rename = "requiresWrap")]
    pub requires_wrap: bool,
}

impl RenderCommand {
    pub fn text_run(&self) -> Option<&TextRun> {
        match &self.kind {
            CommandKind::Text(run) => Some(run),
            _ => None,
        }
    }
}

/// Commands of one label, tagged with the format version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandBatch {
    pub version: u32,
    pub template: String,
    pub commands: Vec<RenderCommand>,
}

impl CommandBatch {
    pub fn new(template_code: &str, commands: Vec<RenderCommand>) -> Self {
        Self {
            version: COMMAND_FORMAT_VERSION,
            template: template_code.to_string(),
            commands,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a batch, rejecting other format versions
    pub fn from_json(json: &str) -> Result<Self> {
        let batch: Self = serde_json::from_str(json)?;
        if batch.version != COMMAND_FORMAT_VERSION {
            return Err(TemplateError::ParseError(format!(
                "unsupported command format version {} (expected {COMMAND_FORMAT_VERSION})",
                batch.version
            )));
        }
        Ok(batch)
    }
}
