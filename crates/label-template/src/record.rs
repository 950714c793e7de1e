//! Order records and their raw / display projections

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Known record columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Id,
    Ogb03,
    Ogb19,
    Ogb092,
    Ogb905,
    Ogd12b,
    Ogd12e,
    Ima902,
    Ogd15,
    /// Shipped quantity
    Ogd09,
    /// Ship date, `yyyy-MM-dd`
    Obe25,
    NvrCust,
    NvrCustItemNo,
    NvrCustPn,
    NvrRemark10,
    Pono,
    Erpmat,
    Cscustpo,
}

impl FieldKey {
    pub const ALL: [FieldKey; 18] = [
        FieldKey::Id,
        FieldKey::Ogb03,
        FieldKey::Ogb19,
        FieldKey::Ogb092,
        FieldKey::Ogb905,
        FieldKey::Ogd12b,
        FieldKey::Ogd12e,
        FieldKey::Ima902,
        FieldKey::Ogd15,
        FieldKey::Ogd09,
        FieldKey::Obe25,
        FieldKey::NvrCust,
        FieldKey::NvrCustItemNo,
        FieldKey::NvrCustPn,
        FieldKey::NvrRemark10,
        FieldKey::Pono,
        FieldKey::Erpmat,
        FieldKey::Cscustpo,
    ];

    /// Column name as used in templates and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Id => "id",
            FieldKey::Ogb03 => "ogb03",
            FieldKey::Ogb19 => "ogb19",
            FieldKey::Ogb092 => "ogb092",
            FieldKey::Ogb905 => "ogb905",
            FieldKey::Ogd12b => "ogd12b",
            FieldKey::Ogd12e => "ogd12e",
            FieldKey::Ima902 => "ima902",
            FieldKey::Ogd15 => "ogd15",
            FieldKey::Ogd09 => "ogd09",
            FieldKey::Obe25 => "obe25",
            FieldKey::NvrCust => "nvr_cust",
            FieldKey::NvrCustItemNo => "nvr_cust_item_no",
            FieldKey::NvrCustPn => "nvr_cust_pn",
            FieldKey::NvrRemark10 => "nvr_remark10",
            FieldKey::Pono => "pono",
            FieldKey::Erpmat => "erpmat",
            FieldKey::Cscustpo => "cscustpo",
        }
    }

    /// Case-insensitive lookup; surrounding whitespace is ignored
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(key))
    }

    /// Columns whose display value gets thousands separators
    pub fn is_quantity(&self) -> bool {
        matches!(self, FieldKey::Ogd09)
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of imported order data
///
/// Values are stored as imported. [`Record::raw_value`] trims them and
/// never formats; [`Record::display_value`] formats for people.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub ogb03: String,
    pub ogb19: String,
    pub ogb092: String,
    pub ogb905: String,
    pub ogd12b: String,
    pub ogd12e: String,
    pub ima902: String,
    pub ogd15: String,
    pub ogd09: String,
    pub obe25: String,
    pub nvr_cust: String,
    pub nvr_cust_item_no: String,
    pub nvr_cust_pn: String,
    pub nvr_remark10: String,
    pub pono: String,
    pub erpmat: String,
    pub cscustpo: String,
}

impl Record {
    /// Empty record with a freshly generated id
    pub fn new() -> Self {
        Self {
            id: Some(Uuid::new_v4()),
            ..Self::default()
        }
    }

    /// Generate an id if the record has none; an existing id is kept
    pub fn ensure_id(&mut self) -> Uuid {
        *self.id.get_or_insert_with(Uuid::new_v4)
    }

    /// Builder-style setter
    pub fn with(mut self, key: FieldKey, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a column value
    ///
    /// For [`FieldKey::Id`] the value must be a UUID; anything else clears
    /// the id so that the next [`Record::ensure_id`] replaces it.
    pub fn set(&mut self, key: FieldKey, value: impl Into<String>) {
        let value = value.into();
        match self.column_mut(key) {
            Some(slot) => *slot = value,
            None => {
                self.id = Uuid::parse_str(value.trim()).ok();
                if self.id.is_none() && !value.trim().is_empty() {
                    log::warn!("ignoring malformed record id {value:?}");
                }
            }
        }
    }

    fn column(&self, key: FieldKey) -> Option<&str> {
        let value = match key {
            FieldKey::Id => return None,
            FieldKey::Ogb03 => &self.ogb03,
            FieldKey::Ogb19 => &self.ogb19,
            FieldKey::Ogb092 => &self.ogb092,
            FieldKey::Ogb905 => &self.ogb905,
            FieldKey::Ogd12b => &self.ogd12b,
            FieldKey::Ogd12e => &self.ogd12e,
            FieldKey::Ima902 => &self.ima902,
            FieldKey::Ogd15 => &self.ogd15,
            FieldKey::Ogd09 => &self.ogd09,
            FieldKey::Obe25 => &self.obe25,
            FieldKey::NvrCust => &self.nvr_cust,
            FieldKey::NvrCustItemNo => &self.nvr_cust_item_no,
            FieldKey::NvrCustPn => &self.nvr_cust_pn,
            FieldKey::NvrRemark10 => &self.nvr_remark10,
            FieldKey::Pono => &self.pono,
            FieldKey::Erpmat => &self.erpmat,
            FieldKey::Cscustpo => &self.cscustpo,
        };
        Some(value)
    }

    fn column_mut(&mut self, key: FieldKey) -> Option<&mut String> {
        let value = match key {
            FieldKey::Id => return None,
            FieldKey::Ogb03 => &mut self.ogb03,
            FieldKey::Ogb19 => &mut self.ogb19,
            FieldKey::Ogb092 => &mut self.ogb092,
            FieldKey::Ogb905 => &mut self.ogb905,
            FieldKey::Ogd12b => &mut self.ogd12b,
            FieldKey::Ogd12e => &mut self.ogd12e,
            FieldKey::Ima902 => &mut self.ima902,
            FieldKey::Ogd15 => &mut self.ogd15,
            FieldKey::Ogd09 => &mut self.ogd09,
            FieldKey::Obe25 => &mut self.obe25,
            FieldKey::NvrCust => &mut self.nvr_cust,
            FieldKey::NvrCustItemNo => &mut self.nvr_cust_item_no,
            FieldKey::NvrCustPn => &mut self.nvr_cust_pn,
            FieldKey::NvrRemark10 => &mut self.nvr_remark10,
            FieldKey::Pono => &mut self.pono,
            FieldKey::Erpmat => &mut self.erpmat,
            FieldKey::Cscustpo => &mut self.cscustpo,
        };
        Some(value)
    }

    /// Trimmed value of a known column
    pub fn raw(&self, key: FieldKey) -> String {
        match key {
            FieldKey::Id => self.id.map(|id| id.to_string()).unwrap_or_default(),
            _ => self.column(key).unwrap_or_default().trim().to_string(),
        }
    }

    /// Trimmed value by column name; empty for unknown names
    pub fn raw_value(&self, key: &str) -> String {
        FieldKey::parse(key)
            .map(|key| self.raw(key))
            .unwrap_or_default()
    }

    /// Value formatted for display by column name
    pub fn display_value(&self, key: &str) -> String {
        match FieldKey::parse(key) {
            Some(key) if key.is_quantity() => label_text::format_quantity(&self.raw(key)),
            Some(key) => self.raw(key),
            None => String::new(),
        }
    }
}
