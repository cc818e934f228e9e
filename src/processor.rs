use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::ProcessorConfig;
use crate::expansion::{
    DistributionSummary, ExpandedRow, Expansion, ExpansionSource, LineNumbers, expand,
};
use crate::expressions::{Describe, Expression};
use crate::lookup::LookupTable;
use crate::natural::interpret_with;
use crate::pattern::{is_natural_language, parse};
use crate::resolver::{Resolution, resolve};

/// Range of lines an input filled, for the grid's auto-fill handle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoFillData {
    pub first_line: u32,
    pub last_line: u32,
    pub fill_count: u32,
    pub value: String,
}

/// Everything generated from one input (a line, or a run of prose lines).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub input_pattern: String,
    pub is_natural_language: bool,
    pub is_quantity_based: bool,
    pub match_count: u32,
    pub found_in_sheets: Vec<String>,
    pub generated_patterns: Vec<String>,
    pub total_generated_rows: u32,
    pub rows: Vec<ExpandedRow>,
    pub auto_fill_data: Option<AutoFillData>,
    pub distribution_summary: Option<DistributionSummary>,
    pub generated_expressions: Vec<Expression>,
}

/// One worksheet of pattern text. Each sheet is processed as its own block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternSheet {
    pub name: String,
    pub cells: Vec<Vec<String>>,
}

impl PatternSheet {
    pub fn cell_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    /// Non-empty cells in row-major order, one per line.
    pub fn to_block(&self) -> String {
        self.cells
            .iter()
            .flatten()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub total_patterns: usize,
    pub sheets_analyzed: usize,
    pub cells_scanned: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub results: Vec<ProcessingResult>,
    pub summary: ScanSummary,
}

enum Segment {
    Line(String),
    Prose(String),
}

/// Split a block into delimited lines and runs of consecutive prose lines.
fn segments(block: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut prose: Vec<&str> = Vec::new();

    for line in block.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if is_natural_language(line) {
            prose.push(line);
            continue;
        }
        if !prose.is_empty() {
            out.push(Segment::Prose(prose.join("\n")));
            prose.clear();
        }
        out.push(Segment::Line(line.to_string()));
    }
    if !prose.is_empty() {
        out.push(Segment::Prose(prose.join("\n")));
    }
    out
}

/// Runs the parse → resolve → expand → describe pipeline against one
/// lookup table snapshot. Line numbers keep counting across every block
/// handed to the same processor.
pub struct Processor<'a> {
    table: &'a LookupTable,
    config: &'a ProcessorConfig,
    lines: LineNumbers,
}

impl<'a> Processor<'a> {
    pub fn new(table: &'a LookupTable, config: &'a ProcessorConfig) -> Self {
        Processor {
            table,
            config,
            lines: LineNumbers::new(),
        }
    }

    pub fn process_block(&mut self, block: &str) -> Vec<ProcessingResult> {
        let results: Vec<ProcessingResult> = segments(block)
            .into_iter()
            .map(|segment| match segment {
                Segment::Line(line) => self.process_line(&line),
                Segment::Prose(text) => self.process_prose(&text),
            })
            .collect();

        info!(
            "processed {} pattern(s) into {} row(s)",
            results.len(),
            results.iter().map(|r| r.total_generated_rows).sum::<u32>()
        );
        results
    }

    /// Process every sheet as an independent block and concatenate.
    pub fn process_sheets(&mut self, sheets: &[PatternSheet]) -> ScanReport {
        let mut report = ScanReport::default();
        for sheet in sheets {
            debug!("scanning sheet {:?}", sheet.name);
            report.summary.cells_scanned += sheet.cell_count();
            report.results.extend(self.process_block(&sheet.to_block()));
        }
        report.summary.sheets_analyzed = sheets.len();
        report.summary.total_patterns = report.results.len();
        info!(
            "scanned {} sheet(s), {} cell(s), {} pattern(s)",
            report.summary.sheets_analyzed,
            report.summary.cells_scanned,
            report.summary.total_patterns
        );
        report
    }

    fn process_line(&mut self, line: &str) -> ProcessingResult {
        let pattern = parse(line);
        debug!("line {:?} parsed as {:?}", line, pattern);
        let resolution = resolve(&pattern.receptacle, self.table);
        let expansion = expand(
            ExpansionSource::Pattern(&pattern),
            line,
            &resolution,
            self.config,
            &mut self.lines,
        );
        build_result(line, false, pattern.is_quantity_based, &resolution, expansion)
    }

    fn process_prose(&mut self, text: &str) -> ProcessingResult {
        let spec = interpret_with(text, self.config);
        debug!("prose interpreted as {:?}", spec);
        let resolution = resolve(&spec.receptacle_type, self.table);
        let expansion = expand(
            ExpansionSource::Natural(&spec),
            text,
            &resolution,
            self.config,
            &mut self.lines,
        );
        build_result(text, true, false, &resolution, expansion)
    }
}

fn build_result(
    input: &str,
    is_natural_language: bool,
    is_quantity_based: bool,
    resolution: &Resolution,
    expansion: Expansion,
) -> ProcessingResult {
    let rows = expansion.rows;
    let total = rows.len() as u32;

    let mut found_in_sheets = Vec::new();
    if resolution.found && !resolution.record.source_sheet.is_empty() {
        found_in_sheets.push(resolution.record.source_sheet.clone());
    }

    let auto_fill_data = match (rows.first(), rows.last()) {
        (Some(first), Some(last)) if is_quantity_based || is_natural_language => {
            Some(AutoFillData {
                first_line: first.line_number,
                last_line: last.line_number,
                fill_count: total,
                value: first.receptacle.clone(),
            })
        }
        _ => None,
    };

    let mut result = ProcessingResult {
        input_pattern: input.to_string(),
        is_natural_language,
        is_quantity_based,
        match_count: rows.iter().filter(|r| r.found_in_lookup).count() as u32,
        found_in_sheets,
        generated_patterns: generated_patterns(&rows, is_quantity_based || is_natural_language),
        total_generated_rows: total,
        rows,
        auto_fill_data,
        distribution_summary: expansion.distribution,
        generated_expressions: Vec::new(),
    };
    result.generated_expressions = result.describe();
    result
}

/// Collapse runs of identical rows back into `pattern !count` form.
fn generated_patterns(rows: &[ExpandedRow], with_counts: bool) -> Vec<String> {
    let mut patterns = Vec::new();
    let mut start = 0;
    while start < rows.len() {
        let run = rows[start..]
            .iter()
            .take_while(|r| r.same_configuration(&rows[start]))
            .count();
        let text = rows[start].pattern_text();
        if with_counts {
            patterns.push(format!("{} !{}", text, run));
        } else {
            patterns.push(text);
        }
        start += run;
    }
    patterns
}

/// Process a text block against `table` with the default configuration.
///
/// ```
/// use whipgen::lookup::LookupTable;
/// use whipgen::processor::process_block;
///
/// assert!(process_block("", &LookupTable::default()).is_empty());
/// ```
pub fn process_block(block: &str, table: &LookupTable) -> Vec<ProcessingResult> {
    process_block_with(block, table, &ProcessorConfig::default())
}

pub fn process_block_with(
    block: &str,
    table: &LookupTable,
    config: &ProcessorConfig,
) -> Vec<ProcessingResult> {
    Processor::new(table, config).process_block(block)
}

pub fn scan_sheets(
    sheets: &[PatternSheet],
    table: &LookupTable,
    config: &ProcessorConfig,
) -> ScanReport {
    Processor::new(table, config).process_sheets(sheets)
}

/// All rows of a run, in line order.
pub fn all_rows(results: &[ProcessingResult]) -> impl Iterator<Item = &ExpandedRow> {
    results.iter().flat_map(|r| r.rows.iter())
}
