use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::ProcessorConfig;
use crate::natural::{LengthRange, NaturalLanguageSpec};
use crate::pattern::{ParsedPattern, format_length};
use crate::resolver::Resolution;

/// One generated order line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedRow {
    pub line_number: u32,
    pub input_pattern: String,
    /// 1-based position of this row among the rows of its input.
    pub input_occurrence: u32,
    pub receptacle: String,
    pub description: String,
    pub cable_type: String,
    pub whip_length: f64,
    pub tail_length: f64,
    pub label_color: String,
    pub found_in_lookup: bool,
    pub matched_in: String,
    pub match_index: Option<usize>,
    pub source_sheet: String,
    pub source_row: usize,
    pub error: Option<String>,
}

impl ExpandedRow {
    /// The row written back as a delimited pattern.
    pub fn pattern_text(&self) -> String {
        let mut parts = vec![
            self.receptacle.clone(),
            self.cable_type.clone(),
            format_length(self.whip_length),
            format_length(self.tail_length),
        ];
        if !self.label_color.is_empty() {
            parts.push(self.label_color.clone());
        }
        parts.join(", ")
    }

    /// Same order line, ignoring where it sits in the output.
    pub fn same_configuration(&self, other: &ExpandedRow) -> bool {
        ExpandedRow {
            line_number: other.line_number,
            input_occurrence: other.input_occurrence,
            ..self.clone()
        } == *other
    }
}

/// Hands out line numbers for one processing run. Numbers start at 1 and
/// only ever increase.
#[derive(Clone, Debug)]
pub struct LineNumbers {
    next: u32,
}

impl Default for LineNumbers {
    fn default() -> Self {
        LineNumbers { next: 1 }
    }
}

impl LineNumbers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> u32 {
        let n = self.next;
        self.next += 1;
        n
    }

    pub fn peek(&self) -> u32 {
        self.next
    }
}

/// One length/color combination of a distributed request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub whip_length: f64,
    pub label_color: Option<String>,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSummary {
    pub total_quantity: u32,
    pub configurations_count: u32,
    pub base_quantity_per_config: u32,
    pub remainder: u32,
    pub configurations: Vec<Configuration>,
}

/// What rows are generated from.
#[derive(Clone, Copy, Debug)]
pub enum ExpansionSource<'a> {
    Pattern(&'a ParsedPattern),
    Natural(&'a NaturalLanguageSpec),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expansion {
    pub rows: Vec<ExpandedRow>,
    pub distribution: Option<DistributionSummary>,
}

/// Split `total` across `configurations` slots as evenly as possible.
///
/// Every slot gets `total / configurations`; the first
/// `total % configurations` slots get one more. `configurations` is
/// treated as at least 1.
///
/// ```
/// use whipgen::expansion::distribute;
///
/// assert_eq!(distribute(10, 4), vec![3, 3, 2, 2]);
/// assert_eq!(distribute(5, 0), vec![5]);
/// ```
pub fn distribute(total: u32, configurations: usize) -> Vec<u32> {
    let count = configurations.max(1);
    let base = total / count as u32;
    let remainder = (total % count as u32) as usize;
    (0..count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Generate the rows for one input.
///
/// Match status and error text are copied from `resolution` onto every row.
/// A quantity above `config.max_quantity` yields a single row whose error
/// also names the cap.
pub fn expand(
    source: ExpansionSource<'_>,
    input: &str,
    resolution: &Resolution,
    config: &ProcessorConfig,
    lines: &mut LineNumbers,
) -> Expansion {
    let requested = match source {
        ExpansionSource::Pattern(pattern) => pattern.requested_quantity(),
        ExpansionSource::Natural(spec) => spec.total_quantity,
    };
    if requested > config.max_quantity {
        return oversized(source, requested, input, resolution, config, lines);
    }

    match source {
        ExpansionSource::Pattern(pattern) => Expansion {
            rows: expand_pattern(pattern, input, resolution, config, lines),
            distribution: None,
        },
        ExpansionSource::Natural(spec) => {
            let (rows, distribution) = expand_natural(spec, input, resolution, config, lines);
            Expansion {
                rows,
                distribution: Some(distribution),
            }
        }
    }
}

/// A request above `max_quantity` becomes one row carrying an error.
fn oversized(
    source: ExpansionSource<'_>,
    requested: u32,
    input: &str,
    resolution: &Resolution,
    config: &ProcessorConfig,
    lines: &mut LineNumbers,
) -> Expansion {
    let message = format!(
        "Requested quantity {} exceeds the maximum of {}",
        requested, config.max_quantity
    );
    warn!("{}", message);

    let mut rows = match source {
        ExpansionSource::Pattern(pattern) => {
            let single = ParsedPattern {
                quantity: Some(1),
                ..pattern.clone()
            };
            expand_pattern(&single, input, resolution, config, lines)
        }
        ExpansionSource::Natural(spec) => {
            let single = NaturalLanguageSpec {
                total_quantity: 1,
                colors: spec.colors.iter().take(1).cloned().collect(),
                length_range: LengthRange::point(spec.length_range.min),
                ..spec.clone()
            };
            expand_natural(&single, input, resolution, config, lines).0
        }
    };
    for row in &mut rows {
        row.error = Some(match row.error.take() {
            Some(error) => format!("{}; {}", error, message),
            None => message.clone(),
        });
    }
    Expansion {
        rows,
        distribution: None,
    }
}

fn expand_pattern(
    pattern: &ParsedPattern,
    input: &str,
    resolution: &Resolution,
    config: &ProcessorConfig,
    lines: &mut LineNumbers,
) -> Vec<ExpandedRow> {
    let record = &resolution.record;
    let template = RowTemplate {
        cable_type: pick_text(pattern.conduit_type.as_deref(), &record.cable_type, config),
        whip_length: pattern.whip_length.unwrap_or(record.whip_length),
        tail_length: pattern.tail_length.unwrap_or(record.tail_length),
        label_color: pattern
            .label_color
            .clone()
            .unwrap_or_else(|| record.label_color.clone()),
    };

    (1..=pattern.requested_quantity())
        .map(|occurrence| template.row(input, occurrence, resolution, lines.take()))
        .collect()
}

fn expand_natural(
    spec: &NaturalLanguageSpec,
    input: &str,
    resolution: &Resolution,
    config: &ProcessorConfig,
    lines: &mut LineNumbers,
) -> (Vec<ExpandedRow>, DistributionSummary) {
    let record = &resolution.record;
    let lengths = spec.length_range.discretize(config.length_step);
    let colors: Vec<Option<String>> = if spec.colors.is_empty() {
        vec![None]
    } else {
        spec.colors.iter().cloned().map(Some).collect()
    };

    // Length-major order: every color of the first length, then the next.
    let combos: Vec<(f64, Option<String>)> = lengths
        .iter()
        .flat_map(|length| colors.iter().map(move |color| (*length, color.clone())))
        .collect();
    let quantities = distribute(spec.total_quantity, combos.len());

    let cable_type = pick_text(
        Some(spec.conduit_type.as_str()).filter(|c| !c.is_empty()),
        &record.cable_type,
        config,
    );
    let tail_length = if record.tail_length > 0.0 {
        record.tail_length
    } else {
        config.default_tail_length
    };

    let mut rows = Vec::with_capacity(spec.total_quantity as usize);
    let mut configurations = Vec::with_capacity(combos.len());
    let mut occurrence = 0;

    for ((whip_length, color), quantity) in combos.into_iter().zip(quantities) {
        let template = RowTemplate {
            cable_type: cable_type.clone(),
            whip_length,
            tail_length,
            label_color: color.clone().unwrap_or_else(|| record.label_color.clone()),
        };
        for _ in 0..quantity {
            occurrence += 1;
            rows.push(template.row(input, occurrence, resolution, lines.take()));
        }
        configurations.push(Configuration {
            whip_length,
            label_color: color,
            quantity,
        });
    }

    let count = configurations.len() as u32;
    let summary = DistributionSummary {
        total_quantity: spec.total_quantity,
        configurations_count: count,
        base_quantity_per_config: spec.total_quantity / count,
        remainder: spec.total_quantity % count,
        configurations,
    };
    (rows, summary)
}

fn pick_text(preferred: Option<&str>, fallback: &str, config: &ProcessorConfig) -> String {
    preferred
        .map(str::to_string)
        .or_else(|| Some(fallback.to_string()).filter(|f| !f.is_empty()))
        .or_else(|| config.default_conduit.clone())
        .unwrap_or_default()
}

/// Fields shared by every row of one configuration.
struct RowTemplate {
    cable_type: String,
    whip_length: f64,
    tail_length: f64,
    label_color: String,
}

impl RowTemplate {
    fn row(
        &self,
        input: &str,
        occurrence: u32,
        resolution: &Resolution,
        line_number: u32,
    ) -> ExpandedRow {
        ExpandedRow {
            line_number,
            input_pattern: input.to_string(),
            input_occurrence: occurrence,
            receptacle: resolution.record.receptacle.clone(),
            description: resolution.record.description.clone(),
            cable_type: self.cable_type.clone(),
            whip_length: self.whip_length,
            tail_length: self.tail_length,
            label_color: self.label_color.clone(),
            found_in_lookup: resolution.found,
            matched_in: resolution.matched_in(),
            match_index: resolution.index,
            source_sheet: resolution.record.source_sheet.clone(),
            source_row: resolution.record.source_row,
            error: resolution.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_goes_to_leading_configurations() {
        assert_eq!(distribute(11, 4), vec![3, 3, 3, 2]);
        assert_eq!(distribute(3, 5), vec![1, 1, 1, 0, 0]);
        assert_eq!(distribute(0, 2), vec![0, 0]);
    }

    #[test]
    fn distribution_is_exact_and_even() {
        for total in [0, 1, 7, 859, 860, 861] {
            for count in 1..=12 {
                let q = distribute(total, count);
                assert_eq!(q.iter().sum::<u32>(), total);
                let (min, max) = (q.iter().min().unwrap(), q.iter().max().unwrap());
                assert!(max - min <= 1);
            }
        }
    }

    #[test]
    fn oversized_quantity_degrades_to_flagged_row() {
        let config = ProcessorConfig {
            max_quantity: 100,
            ..ProcessorConfig::default()
        };
        let resolution = crate::resolver::resolve("CS8269A", &Default::default());
        let mut lines = LineNumbers::new();

        let pattern = crate::pattern::parse("CS8269A, LMZC, 20, 10, Red !4000000000");
        let expansion = expand(
            ExpansionSource::Pattern(&pattern),
            "CS8269A, LMZC, 20, 10, Red !4000000000",
            &resolution,
            &config,
            &mut lines,
        );
        assert_eq!(expansion.rows.len(), 1);
        let error = expansion.rows[0].error.as_deref().unwrap();
        assert!(error.contains("exceeds the maximum of 100"));

        let spec = crate::natural::interpret("4000000000 whips, 20'-30', colors red and blue");
        let expansion = expand(
            ExpansionSource::Natural(&spec),
            "4000000000 whips",
            &resolution,
            &config,
            &mut lines,
        );
        assert_eq!(expansion.rows.len(), 1);
        assert!(expansion.distribution.is_none());
        assert_eq!(expansion.rows[0].line_number, 2);
    }

    #[test]
    fn line_numbers_increase() {
        let mut lines = LineNumbers::new();
        assert_eq!(lines.take(), 1);
        assert_eq!(lines.take(), 2);
        assert_eq!(lines.peek(), 3);
    }
}
