//! Template JSON parsing and combine patterns

use crate::{LabelTemplate, Result, TemplateError};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Parse a template from JSON string (no validation)
pub fn parse_template(json: &str) -> Result<LabelTemplate> {
    serde_json::from_str(json).map_err(|e| TemplateError::ParseError(e.to_string()))
}

/// Parse a list of templates from JSON string (no validation)
pub fn parse_catalog(json: &str) -> Result<Vec<LabelTemplate>> {
    serde_json::from_str(json).map_err(|e| TemplateError::ParseError(e.to_string()))
}

/// Piece of a combine pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombinePart {
    Literal(String),
    /// Record column placeholder, without braces
    Key(String),
}

/// QR payload template such as `{pono};{ima902};{ogd09}`
///
/// Placeholders are `{column}` with `column` made of ASCII letters, digits
/// and `_`. Everything between placeholders is copied verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CombinePattern {
    pattern: String,
    parts: Vec<CombinePart>,
}

impl CombinePattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let placeholder = Regex::new(r"\{([^{}]*)\}")
            .map_err(|e| TemplateError::ParseError(e.to_string()))?;

        let mut parts = Vec::new();
        let mut last = 0;
        for caps in placeholder.captures_iter(pattern) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let key = key.as_str();
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(TemplateError::ParseError(format!(
                    "invalid placeholder {{{key}}} in combine pattern {pattern:?}"
                )));
            }

            if whole.start() > last {
                parts.push(CombinePart::Literal(pattern[last..whole.start()].to_string()));
            }
            parts.push(CombinePart::Key(key.to_string()));
            last = whole.end();
        }
        if last < pattern.len() {
            parts.push(CombinePart::Literal(pattern[last..].to_string()));
        }

        if !parts.iter().any(|part| matches!(part, CombinePart::Key(_))) {
            return Err(TemplateError::ParseError(format!(
                "combine pattern {pattern:?} has no placeholders"
            )));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn parts(&self) -> &[CombinePart] {
        &self.parts
    }

    /// Placeholder keys in order of appearance
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            CombinePart::Key(key) => Some(key.as_str()),
            CombinePart::Literal(_) => None,
        })
    }

    /// Substitute every placeholder with `lookup(key)`
    ///
    /// Empty substitutions keep their delimiters: `{a};{b};{c}` with `b`
    /// empty gives `A;;C`.
    pub fn resolve<F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> String,
    {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                CombinePart::Literal(text) => out.push_str(text),
                CombinePart::Key(key) => out.push_str(&lookup(key)),
            }
        }
        out
    }
}

impl TryFrom<String> for CombinePattern {
    type Error = TemplateError;

    fn try_from(pattern: String) -> Result<Self> {
        Self::parse(&pattern)
    }
}

impl From<CombinePattern> for String {
    fn from(pattern: CombinePattern) -> Self {
        pattern.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_parts() {
        let pattern = CombinePattern::parse("{pono};{ima902};{ogd09};{nvr_remark10}").unwrap();
        assert_eq!(
            pattern.placeholders().collect::<Vec<_>>(),
            vec!["pono", "ima902", "ogd09", "nvr_remark10"]
        );
        assert_eq!(pattern.parts().len(), 7);
        assert_eq!(pattern.as_str(), "{pono};{ima902};{ogd09};{nvr_remark10}");
    }

    #[test]
    fn test_leading_and_trailing_literals() {
        let pattern = CombinePattern::parse("PO:{pono}|").unwrap();
        assert_eq!(
            pattern.parts(),
            &[
                CombinePart::Literal("PO:".into()),
                CombinePart::Key("pono".into()),
                CombinePart::Literal("|".into()),
            ]
        );
    }

    #[test]
    fn test_resolve_preserves_delimiters() {
        let pattern = CombinePattern::parse("{a};{b};{c}").unwrap();
        let lookup = |key: &str| match key {
            "a" => "A".to_string(),
            "c" => "C".to_string(),
            _ => String::new(),
        };
        assert_eq!(pattern.resolve(lookup), "A;;C");
        assert_eq!(pattern.resolve(|_| String::new()), ";;");
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(CombinePattern::parse("{}").is_err());
        assert!(CombinePattern::parse("{po no}").is_err());
        assert!(CombinePattern::parse("no placeholders").is_err());
        assert!(CombinePattern::parse("").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let pattern: CombinePattern = serde_json::from_str(r#""{cscustpo};{erpmat}""#).unwrap();
        assert_eq!(serde_json::to_string(&pattern).unwrap(), r#""{cscustpo};{erpmat}""#);
        assert!(serde_json::from_str::<CombinePattern>(r#""{bad key}""#).is_err());
    }

    #[test]
    fn test_parse_template_error() {
        assert!(matches!(
            parse_template("{ not json"),
            Err(TemplateError::ParseError(_))
        ));
    }
}
