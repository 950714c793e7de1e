//! Template catalog

use crate::parser::parse_catalog;
use crate::schema::LabelTemplate;
use crate::{Result, TemplateError};
use std::collections::HashSet;

const BUILTIN_TEMPLATES: &str = include_str!("../data/templates.json");

/// Validated set of label templates with unique codes
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<LabelTemplate>,
}

impl TemplateCatalog {
    /// The two shipping label layouts shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_TEMPLATES)
    }

    /// Load a JSON array of templates, validating each one
    pub fn from_json(json: &str) -> Result<Self> {
        let templates = parse_catalog(json)?;

        let mut codes = HashSet::new();
        for template in &templates {
            template.validate()?;
            if !codes.insert(template.code.as_str()) {
                return Err(TemplateError::ValidationError(format!(
                    "duplicate template code {}",
                    template.code
                )));
            }
        }

        log::debug!("loaded {} template(s)", templates.len());
        Ok(Self { templates })
    }

    /// Template by exact code
    pub fn by_code(&self, code: &str) -> Option<&LabelTemplate> {
        self.templates.iter().find(|t| t.code == code)
    }

    pub fn all(&self) -> &[LabelTemplate] {
        &self.templates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_layouts() {
        let catalog = TemplateCatalog::builtin().unwrap();
        let codes: Vec<_> = catalog.all().iter().map(|t| t.code.as_str()).collect();
        assert_eq!(codes, vec!["QW075551-1", "QW075551-2"]);

        let first = catalog.by_code("QW075551-1").unwrap();
        assert_eq!((first.size.width, first.size.height), (100.0, 80.0));
        assert!(first.border);
        assert_eq!(first.fields.len(), 15);

        let second = catalog.by_code("QW075551-2").unwrap();
        assert_eq!((second.size.width, second.size.height), (100.0, 60.0));
        assert!(!second.border);
        assert_eq!(second.fields.len(), 14);
    }

    #[test]
    fn test_unknown_code() {
        let catalog = TemplateCatalog::builtin().unwrap();
        assert!(catalog.by_code("QW075551-3").is_none());
        assert!(catalog.by_code("qw075551-1").is_none());
    }

    #[test]
    fn test_only_second_layout_has_barcode() {
        let catalog = TemplateCatalog::builtin().unwrap();
        let barcodes = |code: &str| {
            catalog
                .by_code(code)
                .unwrap()
                .fields
                .iter()
                .filter(|f| matches!(f, Field::Barcode(_)))
                .count()
        };
        assert_eq!(barcodes("QW075551-1"), 0);
        assert_eq!(barcodes("QW075551-2"), 1);
    }

    #[test]
    fn test_duplicate_codes_rejected() {
        let json = r#"[
            { "code": "A", "name": "a", "size": { "width": 10, "height": 10 }, "fields": [] },
            { "code": "A", "name": "b", "size": { "width": 10, "height": 10 }, "fields": [] }
        ]"#;
        let err = TemplateCatalog::from_json(json).unwrap_err();
        assert!(matches!(err, TemplateError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_template_rejected() {
        let json = r#"[
            { "code": "A", "name": "a", "size": { "width": 0, "height": 10 }, "fields": [] }
        ]"#;
        assert!(matches!(
            TemplateCatalog::from_json(json),
            Err(TemplateError::ValidationError(_))
        ));
        assert!(matches!(
            TemplateCatalog::from_json("{}"),
            Err(TemplateError::ParseError(_))
        ));
    }
}
