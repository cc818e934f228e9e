use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::natural;

lazy_static! {
    static ref LENGTH_REGEX: Regex =
        Regex::new(r#"(?i)^(\d+(?:\.\d+)?)\s*(?:'|"|ft\.?|feet|foot)?$"#).unwrap();
    static ref NATURAL_WORDS_REGEX: Regex = Regex::new(
        r"(?i)\b(total|whips?|ranging|colou?rs?|feet|lengths?|need|including|between)\b"
    )
    .unwrap();
}

/// Lines with more tokens than a full tuple are treated as prose.
const MAX_TUPLE_TOKENS: usize = 5;

/// Structured form of one input line.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPattern {
    pub receptacle: String,
    pub conduit_type: Option<String>,
    pub whip_length: Option<f64>,
    pub tail_length: Option<f64>,
    pub label_color: Option<String>,
    pub quantity: Option<u32>,
    pub is_natural_language: bool,
    pub is_quantity_based: bool,
}

impl ParsedPattern {
    /// Number of rows this pattern asks for.
    pub fn requested_quantity(&self) -> u32 {
        self.quantity.unwrap_or(1).max(1)
    }

    /// Canonical comma-separated rendering, used in generated-pattern traces.
    pub fn canonical(&self) -> String {
        let mut parts = vec![self.receptacle.clone()];
        parts.push(self.conduit_type.clone().unwrap_or_default());
        parts.push(self.whip_length.map(format_length).unwrap_or_default());
        parts.push(self.tail_length.map(format_length).unwrap_or_default());
        if let Some(color) = &self.label_color {
            parts.push(color.clone());
        }
        while parts.len() > 1 && parts.last().is_some_and(|p| p.is_empty()) {
            parts.pop();
        }
        parts.join(", ")
    }
}

/// Parse one input line.
///
/// Never fails: a line that fits no shape still yields a pattern whose
/// receptacle is the raw text, and numeric fields that do not parse are
/// stored as `0` ("unspecified").
///
/// ```
/// use whipgen::pattern::parse;
///
/// let p = parse("CS8269A, LMZC, 20, 10, Red !43");
/// assert_eq!(p.receptacle, "CS8269A");
/// assert_eq!(p.quantity, Some(43));
/// assert!(p.is_quantity_based);
/// ```
pub fn parse(line: &str) -> ParsedPattern {
    let line = line.trim();

    if let Some((prefix, suffix)) = quantity_marker(line) {
        let quantity = parse_quantity(suffix);
        let mut pattern = parse_tuple(prefix.trim());
        if pattern.receptacle.is_empty() {
            pattern.receptacle = line.to_string();
        }
        pattern.quantity = Some(quantity);
        pattern.is_quantity_based = true;
        return pattern;
    }

    if is_natural_language(line) {
        let spec = natural::interpret(line);
        let receptacle = if spec.receptacle_type.is_empty() {
            line.to_string()
        } else {
            spec.receptacle_type.clone()
        };
        return ParsedPattern {
            receptacle,
            conduit_type: Some(spec.conduit_type.clone()).filter(|c| !c.is_empty()),
            whip_length: Some(spec.length_range.min),
            tail_length: None,
            label_color: spec.colors.first().cloned(),
            quantity: Some(spec.total_quantity),
            is_natural_language: true,
            is_quantity_based: false,
        };
    }

    let mut pattern = parse_tuple(line);
    if pattern.receptacle.is_empty() {
        pattern.receptacle = line.to_string();
    }
    pattern
}

/// Whether a line reads as prose rather than a delimited tuple.
pub fn is_natural_language(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || quantity_marker(line).is_some() || is_comma_tuple(line) {
        return false;
    }
    if NATURAL_WORDS_REGEX.is_match(line) {
        return true;
    }
    !line.contains(',') && line.split_whitespace().count() > MAX_TUPLE_TOKENS
}

/// Split a trailing `!N` quantity marker off a trimmed line. The marker is
/// the text after the last `!` and must be a single non-blank token, so an
/// exclamation mark ending a sentence is not a marker.
fn quantity_marker(line: &str) -> Option<(&str, &str)> {
    let bang = line.rfind('!')?;
    let suffix = &line[bang + 1..];
    if suffix.is_empty() || suffix.contains(char::is_whitespace) {
        return None;
    }
    Some((&line[..bang], suffix))
}

/// A comma tuple with at most five fields whose length positions hold
/// lengths, e.g. `L6-30R, FMC, 20 feet, 10 feet, Blue`. Such a line is a
/// tuple even when a unit word reads like prose.
fn is_comma_tuple(line: &str) -> bool {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 3 || fields.len() > MAX_TUPLE_TOKENS {
        return false;
    }
    let is_length = |field: &str| LENGTH_REGEX.is_match(field);
    is_length(fields[2]) && fields.get(3).is_none_or(|f| f.is_empty() || is_length(f))
}

fn parse_tuple(text: &str) -> ParsedPattern {
    let tokens: Vec<&str> = if text.contains(',') {
        text.split(',').map(str::trim).collect()
    } else {
        text.split_whitespace().collect()
    };

    let field = |i: usize| tokens.get(i).copied().filter(|t| !t.is_empty());

    ParsedPattern {
        receptacle: field(0).unwrap_or_default().to_string(),
        conduit_type: field(1).map(str::to_string),
        whip_length: field(2).map(parse_length),
        tail_length: field(3).map(parse_length),
        label_color: field(4).map(str::to_string),
        quantity: None,
        is_natural_language: false,
        is_quantity_based: false,
    }
}

/// `!N` suffix; anything that is not an integer >= 1 means one row.
fn parse_quantity(text: &str) -> u32 {
    match text.trim().parse::<u32>() {
        Ok(n) if n >= 1 => n,
        _ => 1,
    }
}

/// Lenient length parsing: tolerates a trailing unit (`'`, `"`, `ft`,
/// `feet`) and returns `0.0` for anything else.
pub fn parse_length(text: &str) -> f64 {
    LENGTH_REGEX
        .captures(text.trim())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Render a length without a trailing `.0` for whole feet.
pub fn format_length(length: f64) -> String {
    if length.fract() == 0.0 {
        format!("{}", length as i64)
    } else {
        format!("{}", length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_and_whitespace_tuples_agree() {
        assert_eq!(parse("460C9W,MMC,115,10,red"), parse("460C9W  MMC 115 10 red"));
        assert_eq!(parse("460C9W,MMC,115,10,red"), parse("460C9W\tMMC\t115\t10\tred"));
    }

    #[test]
    fn bad_numbers_become_zero() {
        let p = parse("CS8269A, LMZC, twenty, ?, Red");
        assert_eq!(p.whip_length, Some(0.0));
        assert_eq!(p.tail_length, Some(0.0));
        assert_eq!(p.label_color.as_deref(), Some("Red"));
    }

    #[test]
    fn malformed_quantity_defaults_to_one() {
        assert_eq!(parse("CS8269A !abc").quantity, Some(1));
        assert_eq!(parse("CS8269A !0").quantity, Some(1));
        assert_eq!(parse("CS8269A !x").quantity, Some(1));
    }

    #[test]
    fn exclamation_ending_prose_is_not_a_quantity() {
        let line = "We need 40 power whips, IEC pinned and sleeve plug, liquid tight, 20'-30' long. Colors: red, blue!";
        assert!(is_natural_language(line));
        let p = parse(line);
        assert!(p.is_natural_language);
        assert!(!p.is_quantity_based);
        assert_eq!(p.receptacle, "CS8269A");
        assert_eq!(p.quantity, Some(40));

        // Whitespace after the last `!` means it is not a marker either
        assert!(!parse("Great! CS8269A LMZC").is_quantity_based);
        assert!(parse("CS8269A,LMZC,20,10,Red!7").is_quantity_based);
    }

    #[test]
    fn comma_tuple_with_feet_units() {
        let p = parse("L6-30R, FMC, 20 feet, 10 feet, Blue");
        assert!(!p.is_natural_language);
        assert_eq!(p.receptacle, "L6-30R");
        assert_eq!(p.conduit_type.as_deref(), Some("FMC"));
        assert_eq!(p.whip_length, Some(20.0));
        assert_eq!(p.tail_length, Some(10.0));
        assert_eq!(p.label_color.as_deref(), Some("Blue"));

        // Prose with commas still routes to the interpreter
        assert!(is_natural_language("30 whips, L6-30R, ranging from 10 to 30 feet"));
    }

    #[test]
    fn lengths_accept_units() {
        assert_eq!(parse_length("20'"), 20.0);
        assert_eq!(parse_length("7.5 ft"), 7.5);
        assert_eq!(parse_length("15 feet"), 15.0);
        assert_eq!(parse_length("n/a"), 0.0);
    }

    #[test]
    fn canonical_drops_trailing_blanks() {
        assert_eq!(parse("ZZZ").canonical(), "ZZZ");
        assert_eq!(parse("A,B,20,10,Red !3").canonical(), "A, B, 20, 10, Red");
    }

    #[test]
    fn prose_is_detected() {
        assert!(is_natural_language("We need 40 power whips with liquid tight conduit"));
        assert!(!is_natural_language("CS8269A LMZC 20 10 Red"));
        assert!(!is_natural_language("CS8269A, LMZC, 20, 10, Red !4"));
    }

    #[test]
    fn lone_token_keeps_receptacle() {
        let p = parse("ZZZNOTFOUND");
        assert_eq!(p.receptacle, "ZZZNOTFOUND");
        assert!(!p.is_natural_language);
        assert!(!p.is_quantity_based);
        assert_eq!(p.requested_quantity(), 1);
    }
}
