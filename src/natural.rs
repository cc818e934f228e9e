//! Keyword-driven reading of free-form whip requests.
//!
//! Every extractor is an ordered table of [`Rule`]s. The first rule that
//! matches wins, so specific phrases ("IEC pinned and sleeve plug") are
//! listed ahead of generic token shapes. Extending the vocabulary means
//! adding a row to a table, not touching control flow.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ProcessorConfig;

/// A regex paired with the text it produces. `template` may reference
/// capture groups (`$1`, `${2}`).
pub struct Rule {
    pub regex: Regex,
    pub template: &'static str,
}

impl Rule {
    fn new(pattern: &str, template: &'static str) -> Rule {
        Rule {
            regex: Regex::new(pattern).unwrap(),
            template,
        }
    }

    /// Output for the first match in `text`.
    pub fn first(&self, text: &str) -> Option<String> {
        self.regex.captures(text).map(|caps| {
            let mut out = String::new();
            caps.expand(self.template, &mut out);
            out
        })
    }

    /// Output for every match in `text`, in order of appearance.
    pub fn all(&self, text: &str) -> Vec<String> {
        self.regex
            .captures_iter(text)
            .map(|caps| {
                let mut out = String::new();
                caps.expand(self.template, &mut out);
                out
            })
            .collect()
    }
}

lazy_static! {
    pub static ref QUANTITY_RULES: Vec<Rule> = vec![
        Rule::new(r"(?i)\b(\d+)\s+(?:total\s+)?(?:power\s+)?whips?\b", "$1"),
        Rule::new(r"(?i)\b(\d+)\s+total\b", "$1"),
        Rule::new(r"(?i)\btotal\s+(?:of\s+)?(\d+)\b", "$1"),
        Rule::new(r"(?i)\bqty\.?\s*:?\s*(\d+)\b", "$1"),
    ];

    pub static ref RECEPTACLE_RULES: Vec<Rule> = vec![
        Rule::new(r"(?i)\biec\s+pin(?:ned)?\s+(?:and|&)\s+sleeve\b", "CS8269A"),
        Rule::new(r"(?i)\bpin(?:ned)?\s+(?:and|&)\s+sleeve\b", "CS8269A"),
        Rule::new(r"(?i)\bl21-30r?\b", "L21-30R"),
        Rule::new(r"(?i)\bl14-30r?\b", "L14-30R"),
        Rule::new(r"(?i)\bl6-30r?\b", "L6-30R"),
        Rule::new(r"(?i)\bl6-20r?\b", "L6-20R"),
        Rule::new(r"(?i)\bl5-30r?\b", "L5-30R"),
        Rule::new(r"(?i)\bl5-20r?\b", "L5-20R"),
        Rule::new(r"(?i)\b5-20r?\b", "5-20R"),
        // Catalog codes such as CS8269A or 460C9W.
        Rule::new(r"\b([A-Z]{1,4}\d{3,5}[A-Z]{0,2}\d{0,2}[A-Z]?)\b", "$1"),
        Rule::new(r"\b(\d{3}[A-Z]\d{1,2}[A-Z]{1,2})\b", "$1"),
    ];

    pub static ref CONDUIT_RULES: Vec<Rule> = vec![
        Rule::new(r"(?i)\bliquid[-\s]?tight\b", "LMZC"),
        Rule::new(r"(?i)\bseal[-\s]?tight\b", "LMZC"),
        Rule::new(r"(?i)\bflexible\s+metal(?:lic)?\s+conduit\b", "FMC"),
        Rule::new(r"(?i)\bflex\s+conduit\b", "FMC"),
        Rule::new(r"(?i)\bmetal[-\s]clad\b", "MC"),
        Rule::new(r"(?i)\barmou?red\s+cable\b", "MC"),
        Rule::new(r"\b(LMZC|LFMC|FMC|MMC|EMT|MC)\b", "$1"),
    ];

    /// Each rule captures a minimum in group 1 and, optionally, a maximum
    /// in group 2.
    pub static ref LENGTH_RULES: Vec<Regex> = vec![
        Regex::new(r"(\d+(?:\.\d+)?)\s*'\s*(?:-|–|to)\s*(\d+(?:\.\d+)?)\s*'").unwrap(),
        Regex::new(r"(?i)\branging\s+(?:in\s+length\s+)?from\s+(\d+(?:\.\d+)?)\s*(?:'|ft\.?|feet)?\s*(?:to|-|through)\s*(\d+(?:\.\d+)?)").unwrap(),
        Regex::new(r"(?i)\bbetween\s+(\d+(?:\.\d+)?)\s*(?:'|ft\.?|feet)?\s+and\s+(\d+(?:\.\d+)?)").unwrap(),
        Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*(?:-|to)\s*(\d+(?:\.\d+)?)\s*(?:ft\b|feet\b)").unwrap(),
        Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*(?:'|ft\b|feet\b|foot\b)").unwrap(),
    ];

    pub static ref COLOR_RULES: Vec<Rule> = vec![
        Rule::new(r"(?i)\bred\b", "Red"),
        Rule::new(r"(?i)\bblue\b", "Blue"),
        Rule::new(r"(?i)\bgreen\b", "Green"),
        Rule::new(r"(?i)\byellow\b", "Yellow"),
        Rule::new(r"(?i)\borange\b", "Orange"),
        Rule::new(r"(?i)\bwhite\b", "White"),
        Rule::new(r"(?i)\bblack\b", "Black"),
        Rule::new(r"(?i)\bgr[ae]y\b", "Gray"),
        Rule::new(r"(?i)\b(?:purple|violet)\b", "Purple"),
        Rule::new(r"(?i)\bbrown\b", "Brown"),
        Rule::new(r"(?i)\bpink\b", "Pink"),
    ];

    pub static ref FEATURE_RULES: Vec<Rule> = vec![
        Rule::new(r"(?i)\bIP\s?(\d{2})\b", "IP$1"),
        Rule::new(r"(?i)\bbell\s+box(?:es)?\b", "Bell Box"),
        Rule::new(r"\b(\d{1,3})\s*(?:A|[Aa]mps?|[Aa]mperes?)\b", "${1}A"),
        Rule::new(r"(?i)\((\d+)\)\s*#?(\d{1,2})\s*awg\b", "$1 x #$2 AWG"),
        Rule::new(r"(?i)\b(\d+)\s*(?:x|-|\s)\s*#?(\d{1,2})\s*awg\b", "$1 x #$2 AWG"),
        Rule::new(r"(?i)(?:^|[^\d(])#?(\d{1,2})\s*awg\b", "#$1 AWG"),
        Rule::new(r"(?i)\b(\d+)\s*-?\s*(?:wire|conductor)s?\b", "$1 Wire"),
        Rule::new(r"\b(\d{3})\s*(?:V|[Vv]olts?)\b", "${1}V"),
    ];

    static ref COLORS_WORD_REGEX: Regex = Regex::new(r"(?i)\bcolou?rs?\b").unwrap();
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LengthRange {
    pub min: f64,
    pub max: f64,
}

impl LengthRange {
    pub fn new(a: f64, b: f64) -> Self {
        LengthRange {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn point(length: f64) -> Self {
        LengthRange {
            min: length,
            max: length,
        }
    }

    /// Lengths from `min` to `max` in `step` increments. The maximum is
    /// always included even when the span is not a multiple of the step.
    pub fn discretize(&self, step: f64) -> Vec<f64> {
        const MAX_STEPS: usize = 1000;

        if !(step > 0.0) || self.max <= self.min {
            return vec![self.min];
        }
        let mut lengths = Vec::new();
        let mut length = self.min;
        while length < self.max - f64::EPSILON && lengths.len() < MAX_STEPS {
            lengths.push(length);
            length += step;
        }
        lengths.push(self.max);
        lengths
    }
}

/// What a free-form request asks for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaturalLanguageSpec {
    pub total_quantity: u32,
    pub receptacle_type: String,
    pub conduit_type: String,
    pub length_range: LengthRange,
    pub colors: Vec<String>,
    pub features: Vec<String>,
}

/// Interpret a block of prose with the default configuration.
pub fn interpret(block: &str) -> NaturalLanguageSpec {
    interpret_with(block, &ProcessorConfig::default())
}

/// Interpret a whole block of prose. Missing facts fall back to defaults:
/// one whip, no receptacle or conduit, the configured default length and
/// no colors.
///
/// ```
/// use whipgen::natural::interpret;
///
/// let spec = interpret(
///     "We need 860 total power whips, IEC pinned and sleeve plug, liquid tight, \
///      ranging from 20 to 25 feet. Colors: red, blue, green and yellow.",
/// );
/// assert_eq!(spec.total_quantity, 860);
/// assert_eq!(spec.receptacle_type, "CS8269A");
/// assert_eq!(spec.conduit_type, "LMZC");
/// assert_eq!(spec.colors, ["Red", "Blue", "Green", "Yellow"]);
/// ```
pub fn interpret_with(block: &str, config: &ProcessorConfig) -> NaturalLanguageSpec {
    NaturalLanguageSpec {
        total_quantity: extract_quantity(block).unwrap_or(1),
        receptacle_type: first_rule(&RECEPTACLE_RULES, block).unwrap_or_default(),
        conduit_type: first_rule(&CONDUIT_RULES, block).unwrap_or_default(),
        length_range: extract_length_range(block)
            .unwrap_or_else(|| LengthRange::point(config.default_whip_length)),
        colors: extract_colors(block),
        features: extract_features(block),
    }
}

fn first_rule(rules: &[Rule], text: &str) -> Option<String> {
    rules.iter().find_map(|rule| rule.first(text))
}

fn extract_quantity(text: &str) -> Option<u32> {
    QUANTITY_RULES.iter().find_map(|rule| {
        rule.first(text)
            .and_then(|n| n.parse::<u32>().ok())
            .filter(|n| *n >= 1)
    })
}

fn extract_length_range(text: &str) -> Option<LengthRange> {
    LENGTH_RULES.iter().find_map(|regex| {
        let caps = regex.captures(text)?;
        let min = caps.get(1)?.as_str().parse::<f64>().ok()?;
        let max = caps
            .get(2)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(min);
        Some(LengthRange::new(min, max))
    })
}

/// Colors named in the sentence that mentions "colors", in the order
/// they are written.
fn extract_colors(text: &str) -> Vec<String> {
    let Some(word) = COLORS_WORD_REGEX.find(text) else {
        return Vec::new();
    };
    let sentence = sentence_around(text, word.start(), word.end());

    let mut found: Vec<(usize, String)> = COLOR_RULES
        .iter()
        .filter_map(|rule| {
            rule.regex
                .find(sentence)
                .map(|m| (m.start(), rule.template.to_string()))
        })
        .collect();
    found.sort_by_key(|(pos, _)| *pos);

    let mut colors: Vec<String> = Vec::new();
    for (_, color) in found {
        if !colors.contains(&color) {
            colors.push(color);
        }
    }
    colors
}

fn sentence_around(text: &str, start: usize, end: usize) -> &str {
    let is_break = |(i, c): &(usize, char)| {
        matches!(c, ';' | '\n')
            || (*c == '.'
                && text[i + 1..]
                    .chars()
                    .next()
                    .is_none_or(|n| n.is_whitespace()))
    };
    let from = text[..start]
        .char_indices()
        .filter(is_break)
        .last()
        .map(|(i, _)| i + 1)
        .unwrap_or(0);
    let to = text[end..]
        .char_indices()
        .map(|(i, c)| (i + end, c))
        .find(is_break)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[from..to]
}

fn extract_features(text: &str) -> Vec<String> {
    let mut features: Vec<String> = Vec::new();
    for rule in FEATURE_RULES.iter() {
        for feature in rule.all(text) {
            let feature = feature.trim().to_string();
            // "#10 AWG" is already covered by "3 x #10 AWG".
            if !feature.is_empty() && !features.iter().any(|f| f.contains(&feature)) {
                features.push(feature);
            }
        }
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_rules_in_priority_order() {
        assert_eq!(interpret("43 whips please").total_quantity, 43);
        assert_eq!(interpret("120 power whips").total_quantity, 120);
        assert_eq!(interpret("a total of 75 assemblies").total_quantity, 75);
        assert_eq!(interpret("no number here").total_quantity, 1);
    }

    #[test]
    fn alias_beats_generic_code() {
        let spec = interpret("12 whips, pin and sleeve, see drawing CS8264C");
        assert_eq!(spec.receptacle_type, "CS8269A");
    }

    #[test]
    fn generic_code_when_no_alias() {
        assert_eq!(interpret("10 whips with 460C9W plugs").receptacle_type, "460C9W");
        assert_eq!(interpret("10 whips, CS8365C").receptacle_type, "CS8365C");
    }

    #[test]
    fn conduit_phrase_before_code() {
        assert_eq!(interpret("liquid-tight, not FMC").conduit_type, "LMZC");
        assert_eq!(interpret("use FMC throughout").conduit_type, "FMC");
        assert_eq!(interpret("nothing").conduit_type, "");
    }

    #[test]
    fn length_range_shapes() {
        assert_eq!(interpret("20'-30' whips").length_range, LengthRange::new(20.0, 30.0));
        assert_eq!(
            interpret("ranging from 15 to 40 feet").length_range,
            LengthRange::new(15.0, 40.0)
        );
        assert_eq!(interpret("about 12 ft long").length_range, LengthRange::point(12.0));
        assert_eq!(interpret("no lengths").length_range, LengthRange::point(10.0));
    }

    #[test]
    fn discretize_includes_max() {
        assert_eq!(LengthRange::new(20.0, 30.0).discretize(5.0), vec![20.0, 25.0, 30.0]);
        assert_eq!(LengthRange::new(22.0, 30.0).discretize(5.0), vec![22.0, 27.0, 30.0]);
        assert_eq!(LengthRange::point(15.0).discretize(5.0), vec![15.0]);
        assert_eq!(LengthRange::new(10.0, 20.0).discretize(0.0), vec![10.0]);
    }

    #[test]
    fn colors_only_near_the_word() {
        let spec = interpret("Red tags on the box. Colors: blue, Orange and grey.");
        assert_eq!(spec.colors, ["Blue", "Orange", "Gray"]);
        assert!(interpret("red whips").colors.is_empty());
    }

    #[test]
    fn features_collected() {
        let spec = interpret("IP67 rated, with bell box, 30A, (3) #10 AWG, 208V");
        assert_eq!(spec.features, ["IP67", "Bell Box", "30A", "3 x #10 AWG", "208V"]);
    }
}
