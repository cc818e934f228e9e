use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pattern::parse_length;

/// Logical columns of a lookup row. Source sheets spell these in many ways,
/// so every field carries an ordered list of accepted key aliases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupField {
    ChooseReceptacle,
    Receptacle,
    PartNumber,
    Model,
    ProductCode,
    Description,
    CableType,
    WhipLength,
    TailLength,
    ConduitSize,
    ConductorAwg,
    Voltage,
    LabelColor,
}

/// Fields a receptacle token is matched against, in priority order.
pub const MATCH_FIELDS: [LookupField; 5] = [
    LookupField::ChooseReceptacle,
    LookupField::Receptacle,
    LookupField::PartNumber,
    LookupField::Model,
    LookupField::ProductCode,
];

impl LookupField {
    /// Accepted key spellings, most specific first. Keys are compared after
    /// [`normalize_key`], so case, spacing and punctuation do not matter.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            LookupField::ChooseReceptacle => &["Choose receptacle", "Choose receptacle type"],
            LookupField::Receptacle => &["Receptacle", "Receptacle type", "Plug"],
            LookupField::PartNumber => &["Part Number", "Part No", "Part #", "PN"],
            LookupField::Model => &["Model", "Model Number"],
            LookupField::ProductCode => &["Product Code", "SKU", "Code"],
            LookupField::Description => &["Description", "Desc", "Item Description"],
            LookupField::CableType => &["Cable Type", "Conduit Type", "Conduit", "Cable"],
            LookupField::WhipLength => &["Whip Length", "Length", "Whip Length (ft)"],
            LookupField::TailLength => &["Tail Length", "Tail", "Tail Length (ft)"],
            LookupField::ConduitSize => &["Conduit Size", "Trade Size"],
            LookupField::ConductorAwg => &["Conductor AWG", "AWG", "Wire Size", "Conductor"],
            LookupField::Voltage => &["Voltage", "Volts"],
            LookupField::LabelColor => &["Label Color", "Color", "Colour"],
        }
    }

    pub fn label(&self) -> &'static str {
        self.aliases()[0]
    }
}

/// Lowercase and strip everything but letters and digits, so that
/// `"Choose receptacle"`, `"chooseReceptacle"` and `"CHOOSE_RECEPTACLE"`
/// compare equal.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// One row of the external component table.
///
/// The typed fields are resolved once from `specifications`, the raw
/// key/value map the row was read from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupRecord {
    pub receptacle: String,
    pub description: String,
    pub cable_type: String,
    pub whip_length: f64,
    pub tail_length: f64,
    pub conduit_size: String,
    pub conductor_awg: String,
    pub voltage: String,
    pub label_color: String,
    pub source_sheet: String,
    pub source_row: usize,
    pub specifications: BTreeMap<String, String>,
}

impl LookupRecord {
    pub fn from_specifications(
        specifications: BTreeMap<String, String>,
        source_sheet: &str,
        source_row: usize,
    ) -> Self {
        let mut record = LookupRecord {
            source_sheet: source_sheet.to_string(),
            source_row,
            specifications,
            ..LookupRecord::default()
        };

        record.receptacle = MATCH_FIELDS
            .iter()
            .find_map(|f| record.field(*f))
            .unwrap_or_default()
            .to_string();
        record.description = record.text(LookupField::Description);
        record.cable_type = record.text(LookupField::CableType);
        record.whip_length = record.number(LookupField::WhipLength);
        record.tail_length = record.number(LookupField::TailLength);
        record.conduit_size = record.text(LookupField::ConduitSize);
        record.conductor_awg = record.text(LookupField::ConductorAwg);
        record.voltage = record.text(LookupField::Voltage);
        record.label_color = record.text(LookupField::LabelColor);
        record
    }

    /// Convenience constructor from `(key, value)` pairs.
    pub fn from_pairs(pairs: &[(&str, &str)], source_sheet: &str, source_row: usize) -> Self {
        let specifications = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::from_specifications(specifications, source_sheet, source_row)
    }

    /// Placeholder for a token that matched nothing. The leading `*` keeps
    /// unresolved entries visible in exported sheets.
    pub fn unresolved(token: &str) -> Self {
        LookupRecord {
            receptacle: format!("*{}", token.trim()),
            description: "NOT FOUND".to_string(),
            ..LookupRecord::default()
        }
    }

    /// First non-empty value among the field's aliases.
    pub fn field(&self, field: LookupField) -> Option<&str> {
        field.aliases().iter().find_map(|alias| {
            let wanted = normalize_key(alias);
            self.specifications
                .iter()
                .find(|(k, v)| normalize_key(k) == wanted && !v.trim().is_empty())
                .map(|(_, v)| v.trim())
        })
    }

    fn text(&self, field: LookupField) -> String {
        self.field(field).unwrap_or_default().to_string()
    }

    fn number(&self, field: LookupField) -> f64 {
        self.field(field).map(parse_length).unwrap_or(0.0)
    }
}

/// Read-only snapshot of the component table, in source order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupTable {
    pub records: Vec<LookupRecord>,
}

impl LookupTable {
    pub fn new(records: Vec<LookupRecord>) -> Self {
        LookupTable { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LookupRecord> {
        self.records.iter()
    }
}

impl FromIterator<LookupRecord> for LookupTable {
    fn from_iter<I: IntoIterator<Item = LookupRecord>>(iter: I) -> Self {
        LookupTable::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_ignore_case_and_spacing() {
        let record = LookupRecord::from_pairs(
            &[
                ("chooseReceptacle", "CS8269A"),
                ("WHIP_LENGTH", "20'"),
                ("Colour", "Red"),
            ],
            "Sheet1",
            2,
        );
        assert_eq!(record.receptacle, "CS8269A");
        assert_eq!(record.whip_length, 20.0);
        assert_eq!(record.label_color, "Red");
    }

    #[test]
    fn receptacle_falls_back_through_match_fields() {
        let record = LookupRecord::from_pairs(&[("Part Number", "L6-30R")], "Parts", 7);
        assert_eq!(record.receptacle, "L6-30R");
        assert_eq!(record.field(LookupField::ChooseReceptacle), None);
    }

    #[test]
    fn blank_values_are_skipped() {
        let record = LookupRecord::from_pairs(
            &[("Choose receptacle", "  "), ("Receptacle", "460C9W")],
            "Sheet1",
            3,
        );
        assert_eq!(record.receptacle, "460C9W");
    }
}
