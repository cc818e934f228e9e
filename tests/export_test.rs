use std::fs;

use tempfile::tempdir;
use whipgen::downloader::{self, MASTER_BUBBLE_COLUMNS};
use whipgen::loader;
use whipgen::lookup::LookupTable;
use whipgen::processor::ProcessingResult;
use whipgen::saving::{Snapshot, load_snapshot, save_snapshot};
use whipgen::{WhipError, process_block};

const LOOKUP_CSV: &str = "Choose receptacle,Description,Cable Type,Whip Length,Label Color
CS8269A,IEC 60309 pin & sleeve,LMZC,15,White
L6-30R,NEMA twist lock,FMC,,
";

fn sample_results() -> Vec<ProcessingResult> {
    let table = loader::lookup_from_csv_str(LOOKUP_CSV, "Lookup").unwrap();
    process_block("CS8269A, LMZC, 20, 10, Red !2\nZZZ", &table)
}

#[test]
fn test_lookup_from_csv_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("receptacles.csv");
    fs::write(&path, LOOKUP_CSV).unwrap();

    let table = loader::load_lookup(&path).unwrap();
    assert_eq!(table.len(), 2);

    let first = &table.records[0];
    assert_eq!(first.receptacle, "CS8269A");
    assert_eq!(first.cable_type, "LMZC");
    assert_eq!(first.whip_length, 15.0);
    assert_eq!(first.source_sheet, "receptacles");
    assert_eq!(first.source_row, 2);

    // Empty cells leave fields unset rather than failing the row
    let second = &table.records[1];
    assert_eq!(second.receptacle, "L6-30R");
    assert_eq!(second.whip_length, 0.0);
    assert_eq!(second.source_row, 3);
    println!("✓ lookup CSV loaded with sheet/row provenance");
}

#[test]
fn test_unsupported_lookup_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lookup.pdf");
    fs::write(&path, "not a table").unwrap();

    match loader::load_lookup(&path) {
        Err(WhipError::Unsupported(message)) => assert!(message.contains("pdf")),
        other => panic!("expected Unsupported, got {:?}", other.map(|t| t.len())),
    }
    println!("✓ unknown lookup extension rejected");
}

#[test]
fn test_patterns_from_text_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("request.txt");
    fs::write(&path, "CS8269A, LMZC, 20, 10, Red !2\n\nZZZ\n").unwrap();

    let sheets = loader::load_patterns(&path).unwrap();
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0].name, "request");
    assert_eq!(sheets[0].cell_count(), 3);
}

#[test]
fn test_csv_export_layout() {
    let results = sample_results();
    let csv_text = downloader::to_csv(&results).unwrap();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_text.as_bytes());
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, MASTER_BUBBLE_COLUMNS);

    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 3);

    // Commas inside the input pattern survive thanks to quoting
    assert_eq!(&records[0][0], "1");
    assert_eq!(&records[0][1], "CS8269A");
    assert_eq!(&records[0][5], "=D2*E2");
    assert_eq!(&records[0][10], "20");
    assert_eq!(&records[0][13], "CS8269A, LMZC, 20, 10, Red !2");
    assert_eq!(&records[0][14], "OK");

    assert_eq!(&records[2][0], "3");
    assert_eq!(&records[2][1], "*ZZZ");
    assert_ne!(&records[2][14], "OK");
    println!("✓ CSV export in Master Bubble layout");
}

#[test]
fn test_export_by_extension() {
    let results = sample_results();
    let dir = tempdir().unwrap();

    let csv_path = dir.path().join("order.csv");
    downloader::export(&results, &csv_path).unwrap();
    assert!(fs::read_to_string(&csv_path).unwrap().starts_with("Line,Choose receptacle"));

    let json_path = dir.path().join("order.json");
    downloader::export(&results, &json_path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json[0]["totalGeneratedRows"], 2);
    assert_eq!(json[0]["isQuantityBased"], true);

    let bad_path = dir.path().join("order.doc");
    assert!(matches!(
        downloader::export(&results, &bad_path),
        Err(WhipError::Unsupported(_))
    ));
    println!("✓ export format follows the file extension");
}

#[cfg(feature = "xlsx")]
#[test]
fn test_xlsx_export_reads_back() {
    let results = sample_results();
    let bytes = downloader::to_xlsx(&results).unwrap();
    assert!(bytes.starts_with(b"PK"));

    let dir = tempdir().unwrap();
    let path = dir.path().join("order.xlsx");
    fs::write(&path, &bytes).unwrap();

    let sheets = loader::read_workbook(&path).unwrap();
    let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Master Bubble", "Expressions"]);

    let master = &sheets[0];
    assert_eq!(master.cells.len(), 4);
    assert_eq!(master.cells[0][1], "Choose receptacle");
    assert_eq!(master.cells[1][1], "CS8269A");
    assert_eq!(master.cells[3][1], "*ZZZ");
    println!("✓ XLSX workbook written and read back");
}

#[test]
fn test_snapshot_round_trip() {
    let snapshot = Snapshot::new(sample_results());
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.bin.gz");

    save_snapshot(&snapshot, &path).unwrap();
    let loaded = load_snapshot(&path).unwrap();
    assert_eq!(loaded, snapshot);
    assert_eq!(loaded.results[0].rows.len(), 2);
    println!("✓ snapshot saved and restored");
}

#[test]
fn test_snapshot_missing_file() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        load_snapshot(dir.path().join("missing.bin.gz")),
        Err(WhipError::Io(_))
    ));
}

#[test]
fn test_empty_table_export() {
    let results = process_block("ABC123", &LookupTable::default());
    let csv_text = downloader::to_csv(&results).unwrap();
    assert_eq!(csv_text.lines().count(), 2);
    assert!(csv_text.contains("*ABC123"));
}
