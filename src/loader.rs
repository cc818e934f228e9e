use csv::{ReaderBuilder, Trim};
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, WhipError};
use crate::lookup::{LookupRecord, LookupTable};
use crate::processor::PatternSheet;

/// Build lookup records from header-keyed rows.
///
/// `rows[0]` is the header; data rows become records whose
/// `source_row` is their 1-based row number in the sheet. Rows with no
/// receptacle-like value at all are skipped.
fn records_from_rows(rows: &[Vec<String>], sheet: &str) -> Vec<LookupRecord> {
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };

    data.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let specifications: BTreeMap<String, String> = header
                .iter()
                .zip(row.iter())
                .filter(|(k, v)| !k.trim().is_empty() && !v.trim().is_empty())
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .collect();
            let record = LookupRecord::from_specifications(specifications, sheet, i + 2);
            (!record.receptacle.is_empty()).then_some(record)
        })
        .collect()
}

/// Parse lookup rows from CSV text
///
/// The first record is the header; its cells become the specification
/// keys of every following row.
///
/// # Arguments
/// * `content` - CSV text, header first
/// * `sheet` - Name recorded as the source sheet of every record
///
/// # Returns
/// * `Result<LookupTable>` - Records in file order, or a CSV error
///
/// # Examples
/// ```
/// use whipgen::loader::lookup_from_csv_str;
///
/// let table = lookup_from_csv_str("Choose receptacle,Description\nCS8269A,Pin & sleeve\n", "Lookup").unwrap();
/// assert_eq!(table.records[0].receptacle, "CS8269A");
/// assert_eq!(table.records[0].source_row, 2);
/// ```
pub fn lookup_from_csv_str(content: &str, sheet: &str) -> Result<LookupTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let table = LookupTable::new(records_from_rows(&rows, sheet));
    debug!("read {} lookup record(s) from {}", table.len(), sheet);
    Ok(table)
}

/// Load a lookup table from a CSV file
///
/// Records are tagged with the file stem as their source sheet, so
/// `receptacles.csv` yields sheet `receptacles`.
///
/// # Arguments
/// * `path` - Path to the CSV file
///
/// # Returns
/// * `Result<LookupTable>` - The loaded table or an I/O / CSV error
///
/// # Examples
/// ```no_run
/// use whipgen::loader::lookup_from_csv;
///
/// match lookup_from_csv("receptacles.csv") {
///     Ok(table) => println!("Loaded {} lookup rows", table.len()),
///     Err(e) => eprintln!("Error loading lookup CSV: {}", e),
/// }
/// ```
pub fn lookup_from_csv(path: impl AsRef<Path>) -> Result<LookupTable> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    lookup_from_csv_str(&content, &sheet_name_for(path))
}

/// Load a lookup table from an Excel workbook
///
/// Every worksheet is read with its first row as the header, and the
/// records are concatenated in sheet order.
///
/// # Arguments
/// * `path` - Path to the `.xlsx` workbook
///
/// # Returns
/// * `Result<LookupTable>` - Records from all sheets or a workbook error
///
/// # Examples
/// ```no_run
/// use whipgen::loader::lookup_from_excel;
///
/// let table = lookup_from_excel("catalog.xlsx").expect("readable workbook");
/// println!("{} receptacles", table.len());
/// ```
#[cfg(feature = "xlsx")]
pub fn lookup_from_excel(path: impl AsRef<Path>) -> Result<LookupTable> {
    let sheets = read_workbook(path)?;
    let table: LookupTable = sheets
        .iter()
        .flat_map(|sheet| records_from_rows(&sheet.cells, &sheet.name))
        .collect();
    log::info!(
        "loaded {} lookup record(s) from {} sheet(s)",
        table.len(),
        sheets.len()
    );
    Ok(table)
}

/// Read every worksheet as a grid of display strings
///
/// # Arguments
/// * `path` - Path to the `.xlsx` workbook
///
/// # Returns
/// * `Result<Vec<PatternSheet>>` - One sheet per worksheet, in workbook order
#[cfg(feature = "xlsx")]
pub fn read_workbook(path: impl AsRef<Path>) -> Result<Vec<PatternSheet>> {
    use calamine::{Reader, Xlsx, open_workbook};

    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let names = workbook.sheet_names().to_vec();

    let mut sheets = Vec::with_capacity(names.len());
    for (index, name) in names.into_iter().enumerate() {
        let range = match workbook.worksheet_range_at(index) {
            Some(range) => range?,
            None => continue,
        };
        let cells = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        sheets.push(PatternSheet { name, cells });
    }
    Ok(sheets)
}

/// Load a pattern text file as a single sheet, one pattern per line
///
/// # Arguments
/// * `path` - Path to the text file; its stem names the sheet
///
/// # Returns
/// * `Result<Vec<PatternSheet>>` - A one-element list, or an I/O error
pub fn patterns_from_text(path: impl AsRef<Path>) -> Result<Vec<PatternSheet>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    Ok(vec![PatternSheet {
        name: sheet_name_for(path),
        cells: content.lines().map(|l| vec![l.to_string()]).collect(),
    }])
}

/// Load a lookup table, detecting the file type by extension
///
/// # Arguments
/// * `path` - A `.csv`, `.xlsx` or `.xlsm` file
///
/// # Returns
/// * `Result<LookupTable>` - The table, or `WhipError::Unsupported` for any
///   other extension
///
/// # Examples
/// ```no_run
/// use whipgen::loader::load_lookup;
///
/// match load_lookup("lookup.xlsx") {
///     Ok(table) => println!("Loaded {} rows", table.len()),
///     Err(e) => eprintln!("Could not load lookup table: {}", e),
/// }
/// ```
pub fn load_lookup(path: impl AsRef<Path>) -> Result<LookupTable> {
    let path = path.as_ref();
    match extension_of(path).as_deref() {
        Some("csv") => lookup_from_csv(path),
        #[cfg(feature = "xlsx")]
        Some("xlsx") | Some("xlsm") => lookup_from_excel(path),
        #[cfg(not(feature = "xlsx"))]
        Some("xlsx") | Some("xlsm") => Err(WhipError::Unsupported(
            "Excel support requires the 'xlsx' feature".to_string(),
        )),
        Some(ext) => Err(WhipError::Unsupported(format!(
            "unsupported lookup file extension: {}",
            ext
        ))),
        None => Err(WhipError::Unsupported("lookup file has no extension".to_string())),
    }
}

/// Load pattern sheets, detecting the file type by extension
///
/// Workbooks give one sheet per worksheet; anything else is read as text.
///
/// # Arguments
/// * `path` - Pattern workbook or text file
///
/// # Returns
/// * `Result<Vec<PatternSheet>>` - Sheets to scan, in order
pub fn load_patterns(path: impl AsRef<Path>) -> Result<Vec<PatternSheet>> {
    let path = path.as_ref();
    match extension_of(path).as_deref() {
        #[cfg(feature = "xlsx")]
        Some("xlsx") | Some("xlsm") => read_workbook(path),
        #[cfg(not(feature = "xlsx"))]
        Some("xlsx") | Some("xlsm") => Err(WhipError::Unsupported(
            "Excel support requires the 'xlsx' feature".to_string(),
        )),
        _ => patterns_from_text(path),
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

fn sheet_name_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_string()
}
