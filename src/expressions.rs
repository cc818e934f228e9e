//! Human-readable formulas shown next to generated rows.
//!
//! Nothing here feeds back into processing. Expressions are rendered from
//! `{key}` templates; a template that cannot be rendered drops the whole
//! set for that item and logs a warning.

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::expansion::ExpandedRow;
use crate::pattern::format_length;
use crate::processor::ProcessingResult;

/// Header occupies the first sheet row, so line N is written to row N + 1.
const HEADER_ROWS: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    #[serde(rename = "type")]
    pub expr_type: String,
    pub expression: String,
    pub description: String,
}

#[derive(Clone, Copy, Debug)]
pub struct ExpressionTemplate {
    pub expr_type: &'static str,
    pub expression: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("unknown placeholder {{{0}}}")]
    UnknownKey(String),
    #[error("unclosed placeholder in {0:?}")]
    Unclosed(String),
}

const LOOKUP: ExpressionTemplate = ExpressionTemplate {
    expr_type: "lookup",
    expression: "=VLOOKUP(\"{receptacle}\", '{sheet}'!A:Z, 2, FALSE)",
    description: "Description of {receptacle} from {sheet} row {source_row}",
};

const UNRESOLVED: ExpressionTemplate = ExpressionTemplate {
    expr_type: "unresolved",
    expression: "=\"{receptacle}\"",
    description: "{error}",
};

const EXTENDED_PRICE: ExpressionTemplate = ExpressionTemplate {
    expr_type: "extended_price",
    expression: "=D{row}*E{row}",
    description: "Extended price for line {line}: Order QTY x Unit Price",
};

const AUTO_FILL: ExpressionTemplate = ExpressionTemplate {
    expr_type: "auto_fill",
    expression: "=FILL(B{first_row}:B{last_row}, \"{receptacle}\")",
    description: "Auto-fill {count} rows from \"{pattern}\"",
};

const ORDER_TOTAL: ExpressionTemplate = ExpressionTemplate {
    expr_type: "order_total",
    expression: "=SUM(D{first_row}:D{last_row})",
    description: "Total whips generated: {count}",
};

const DISTRIBUTION: ExpressionTemplate = ExpressionTemplate {
    expr_type: "distribution",
    expression: "=FLOOR({total}/{configs}, 1)",
    description: "{total} whips over {configs} length/color configurations, {remainder} with one extra",
};

/// Anything that can explain itself as spreadsheet-style expressions.
pub trait Describe {
    fn describe(&self) -> Vec<Expression>;
}

impl Describe for ExpandedRow {
    fn describe(&self) -> Vec<Expression> {
        let row = (self.line_number + HEADER_ROWS).to_string();
        let vars = vec![
            ("receptacle", self.receptacle.clone()),
            ("sheet", self.source_sheet.clone()),
            ("source_row", self.source_row.to_string()),
            ("row", row),
            ("line", self.line_number.to_string()),
            ("length", format_length(self.whip_length)),
            ("error", self.error.clone().unwrap_or_default()),
        ];
        let first = if self.found_in_lookup { LOOKUP } else { UNRESOLVED };
        render_all(&[first, EXTENDED_PRICE], &vars)
    }
}

impl Describe for ProcessingResult {
    fn describe(&self) -> Vec<Expression> {
        let (Some(first), Some(last)) = (self.rows.first(), self.rows.last()) else {
            return Vec::new();
        };

        let mut vars = vec![
            ("receptacle", first.receptacle.clone()),
            ("first_row", (first.line_number + HEADER_ROWS).to_string()),
            ("last_row", (last.line_number + HEADER_ROWS).to_string()),
            ("count", self.total_generated_rows.to_string()),
            ("pattern", self.input_pattern.replace('\n', " ")),
        ];
        let mut templates = vec![AUTO_FILL, ORDER_TOTAL];

        if let Some(summary) = &self.distribution_summary {
            vars.push(("total", summary.total_quantity.to_string()));
            vars.push(("configs", summary.configurations_count.to_string()));
            vars.push(("remainder", summary.remainder.to_string()));
            templates.push(DISTRIBUTION);
        }
        render_all(&templates, &vars)
    }
}

fn render_all(templates: &[ExpressionTemplate], vars: &[(&str, String)]) -> Vec<Expression> {
    let rendered: Result<Vec<Expression>, TemplateError> = templates
        .iter()
        .map(|t| -> Result<Expression, TemplateError> {
            Ok(Expression {
                expr_type: t.expr_type.to_string(),
                expression: render(t.expression, vars)?,
                description: render(t.description, vars)?,
            })
        })
        .collect();

    rendered.unwrap_or_else(|e| {
        warn!("skipping generated expressions: {}", e);
        Vec::new()
    })
}

/// Substitute `{key}` placeholders from `vars`.
pub fn render(template: &str, vars: &[(&str, String)]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| TemplateError::Unclosed(template.to_string()))?;
        let key = &after[..close];
        let value = vars
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| TemplateError::UnknownKey(key.to_string()))?;
        out.push_str(value);
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes() {
        let vars = [("a", "1".to_string()), ("b", "two".to_string())];
        assert_eq!(render("={a}+{b}", &vars).unwrap(), "=1+two");
        assert_eq!(render("plain", &vars).unwrap(), "plain");
    }

    #[test]
    fn malformed_templates_error() {
        let vars = [("a", "1".to_string())];
        assert_eq!(
            render("{missing}", &vars),
            Err(TemplateError::UnknownKey("missing".to_string()))
        );
        assert!(matches!(render("{a", &vars), Err(TemplateError::Unclosed(_))));
    }

    #[test]
    fn broken_template_degrades_to_empty() {
        let broken = ExpressionTemplate {
            expr_type: "broken",
            expression: "={nope}",
            description: "",
        };
        assert!(render_all(&[LOOKUP, broken], &[("receptacle", "X".to_string())]).is_empty());
    }
}
