use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::lookup::{LookupField, LookupRecord, LookupTable, MATCH_FIELDS};

/// Outcome of looking up one receptacle token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// The matched row, or a `*`-prefixed placeholder when nothing matched.
    pub record: LookupRecord,
    pub found: bool,
    /// Position of the matched row in the table.
    pub index: Option<usize>,
    pub matched_field: Option<LookupField>,
    pub error: Option<String>,
}

impl Resolution {
    /// Where the match came from, for display next to generated rows.
    pub fn matched_in(&self) -> String {
        match (self.found, self.matched_field) {
            (true, Some(field)) => format!("{} ({})", self.record.source_sheet, field.label()),
            (true, None) => self.record.source_sheet.clone(),
            (false, _) => "not found".to_string(),
        }
    }
}

/// Find the first table row whose candidate fields equal or contain `token`.
///
/// Rows are scanned in table order and the first hit wins; there is no
/// ranking between several matching rows.
pub fn resolve(token: &str, table: &LookupTable) -> Resolution {
    let needle = token.trim().to_lowercase();

    if !needle.is_empty() {
        for (index, record) in table.iter().enumerate() {
            if let Some(field) = matching_field(&needle, record) {
                debug!(
                    "resolved {:?} to row {} of {} via {:?}",
                    token, record.source_row, record.source_sheet, field
                );
                return Resolution {
                    record: record.clone(),
                    found: true,
                    index: Some(index),
                    matched_field: Some(field),
                    error: None,
                };
            }
        }
    }

    let error = if needle.is_empty() {
        "No receptacle type recognized".to_string()
    } else {
        format!("Receptacle '{}' not found in lookup table", token.trim())
    };
    warn!("{}", error);

    Resolution {
        record: LookupRecord::unresolved(token),
        found: false,
        index: None,
        matched_field: None,
        error: Some(error),
    }
}

fn matching_field(needle: &str, record: &LookupRecord) -> Option<LookupField> {
    MATCH_FIELDS.iter().copied().find(|field| {
        record.field(*field).is_some_and(|candidate| {
            let candidate = candidate.trim().to_lowercase();
            candidate == needle || candidate.contains(needle)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LookupTable {
        LookupTable::new(vec![
            LookupRecord::from_pairs(
                &[("Choose receptacle", "CS8269A"), ("Description", "IEC pin & sleeve")],
                "Receptacles",
                2,
            ),
            LookupRecord::from_pairs(
                &[("Part Number", "CS8269A-X"), ("Description", "Variant")],
                "Receptacles",
                3,
            ),
            LookupRecord::from_pairs(&[("Model", "L6-30R")], "Twist", 2),
        ])
    }

    #[test]
    fn first_match_wins() {
        let r = resolve("cs8269a", &table());
        assert!(r.found);
        assert_eq!(r.index, Some(0));
        assert_eq!(r.record.description, "IEC pin & sleeve");
        assert_eq!(r.matched_field, Some(LookupField::ChooseReceptacle));
    }

    #[test]
    fn substring_match_on_later_field() {
        let r = resolve(" l6-30 ", &table());
        assert!(r.found);
        assert_eq!(r.index, Some(2));
        assert_eq!(r.matched_in(), "Twist (Model)");
    }

    #[test]
    fn unresolved_is_flagged() {
        let r = resolve("ZZZNOTFOUND", &table());
        assert!(!r.found);
        assert_eq!(r.record.receptacle, "*ZZZNOTFOUND");
        assert!(r.error.is_some());
        assert_eq!(r.matched_in(), "not found");
    }

    #[test]
    fn empty_token_never_matches() {
        let r = resolve("   ", &table());
        assert!(!r.found);
        assert_eq!(r.record.receptacle, "*");
    }
}
