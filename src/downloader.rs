use std::fs;
use std::path::Path;

use crate::error::{Result, WhipError};
use crate::expansion::ExpandedRow;
use crate::pattern::format_length;
use crate::processor::{ProcessingResult, all_rows};

/// Column layout of the Master Bubble order sheet.
pub const MASTER_BUBBLE_COLUMNS: [&str; 15] = [
    "Line",
    "Choose receptacle",
    "Description",
    "Order QTY",
    "Unit Price",
    "Extended Price",
    "Lead Time",
    "Manufacturer",
    "Category",
    "Cable Type",
    "Whip Length",
    "Tail Length",
    "Label Color",
    "Input Pattern",
    "Status",
];

const CATEGORY: &str = "Power Whip";
const LEAD_TIME: &str = "TBD";

/// Sheet row (1-based, header on row 1) a line lands on.
fn sheet_row(line_number: u32) -> u32 {
    line_number + 1
}

fn status(row: &ExpandedRow) -> String {
    match &row.error {
        Some(error) => error.clone(),
        None if row.found_in_lookup => "OK".to_string(),
        None => "NOT FOUND".to_string(),
    }
}

/// One Master Bubble line as text cells. Each generated row orders one whip.
fn master_bubble_record(row: &ExpandedRow) -> Vec<String> {
    let r = sheet_row(row.line_number);
    vec![
        row.line_number.to_string(),
        row.receptacle.clone(),
        row.description.clone(),
        "1".to_string(),
        String::new(),
        format!("=D{}*E{}", r, r),
        LEAD_TIME.to_string(),
        String::new(),
        CATEGORY.to_string(),
        row.cable_type.clone(),
        format_length(row.whip_length),
        format_length(row.tail_length),
        row.label_color.clone(),
        row.input_pattern.replace('\n', " "),
        status(row),
    ]
}

/// Convert results to CSV in Master Bubble column order
///
/// Every generated row becomes one line under the header. Fields containing
/// commas, quotes or newlines are quoted by the CSV writer.
///
/// # Arguments
/// * `results` - Processing results whose rows are exported
///
/// # Returns
/// * `Result<String>` - CSV content as a string or an error
///
/// # Examples
/// ```
/// use whipgen::downloader::to_csv;
/// use whipgen::lookup::LookupTable;
/// use whipgen::process_block;
///
/// let results = process_block("CS8269A !2", &LookupTable::default());
/// let csv = to_csv(&results).unwrap();
/// assert_eq!(csv.lines().count(), 3);
/// ```
pub fn to_csv(results: &[ProcessingResult]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(MASTER_BUBBLE_COLUMNS)?;
    for row in all_rows(results) {
        writer.write_record(master_bubble_record(row))?;
    }

    let bytes = writer.into_inner().map_err(|e| WhipError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| WhipError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Convert results to an XLSX workbook
///
/// The workbook holds the "Master Bubble" sheet (bold header, numeric
/// quantities and lengths, extended-price formulas) and an "Expressions"
/// sheet listing the generated expressions per input.
///
/// # Arguments
/// * `results` - Processing results to export
///
/// # Returns
/// * `Result<Vec<u8>>` - Workbook bytes or a workbook error
///
/// # Examples
/// ```no_run
/// use whipgen::downloader::to_xlsx;
///
/// match to_xlsx(&[]) {
///     Ok(bytes) => std::fs::write("order.xlsx", bytes).unwrap(),
///     Err(e) => eprintln!("Failed to generate XLSX: {}", e),
/// }
/// ```
#[cfg(feature = "xlsx")]
pub fn to_xlsx(results: &[ProcessingResult]) -> Result<Vec<u8>> {
    use rust_xlsxwriter::{Format, Workbook};

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Master Bubble")?;
    for (c, header) in MASTER_BUBBLE_COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, c as u16, *header, &bold)?;
    }

    for row in all_rows(results) {
        // Zero-based row index; row 0 holds the header.
        let r = row.line_number;
        let cells = master_bubble_record(row);
        worksheet.write_number(r, 0, row.line_number)?;
        worksheet.write_string(r, 1, &cells[1])?;
        worksheet.write_string(r, 2, &cells[2])?;
        worksheet.write_number(r, 3, 1.0)?;
        worksheet.write_formula(r, 5, cells[5].as_str())?;
        for c in 6..cells.len() {
            match c {
                10 => worksheet.write_number(r, 10, row.whip_length)?,
                11 => worksheet.write_number(r, 11, row.tail_length)?,
                _ => worksheet.write_string(r, c as u16, &cells[c])?,
            };
        }
    }

    let expressions = workbook.add_worksheet();
    expressions.set_name("Expressions")?;
    for (c, header) in ["Input Pattern", "Type", "Expression", "Description"]
        .iter()
        .enumerate()
    {
        expressions.write_string_with_format(0, c as u16, *header, &bold)?;
    }
    let mut r = 1;
    for result in results {
        for expr in &result.generated_expressions {
            expressions.write_string(r, 0, &result.input_pattern.replace('\n', " "))?;
            expressions.write_string(r, 1, &expr.expr_type)?;
            expressions.write_string(r, 2, &expr.expression)?;
            expressions.write_string(r, 3, &expr.description)?;
            r += 1;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Results as pretty-printed JSON with camelCase field names.
pub fn to_json(results: &[ProcessingResult]) -> Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

/// Write results to a file, choosing the format from its extension
///
/// # Arguments
/// * `results` - Processing results to export
/// * `path` - Destination ending in `.csv`, `.json` or `.xlsx`
///
/// # Returns
/// * `Result<()>` - `WhipError::Unsupported` for any other extension
pub fn export(results: &[ProcessingResult], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("csv") => fs::write(path, to_csv(results)?)?,
        Some("json") => fs::write(path, to_json(results)?)?,
        #[cfg(feature = "xlsx")]
        Some("xlsx") => fs::write(path, to_xlsx(results)?)?,
        Some(ext) => {
            return Err(WhipError::Unsupported(format!(
                "unsupported export extension: {}",
                ext
            )));
        }
        None => return Err(WhipError::Unsupported("export file has no extension".to_string())),
    }
    log::info!("exported {} result(s) to {}", results.len(), path.display());
    Ok(())
}
