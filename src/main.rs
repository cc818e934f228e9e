use std::env;
use std::time::Instant;

use whipgen::config::ProcessorConfig;
use whipgen::processor::all_rows;
use whipgen::{downloader, loader, saving, scan_sheets};

fn usage(program: &str) {
    eprintln!(
        "Usage: {} <lookup.csv|xlsx> <patterns.txt|xlsx> [output.xlsx|csv|json|bin.gz] [--config <file.json>]",
        program
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let start = Instant::now();
    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    // Pull out --config before reading positional arguments
    let mut config = ProcessorConfig::default();
    if let Some(pos) = args.iter().position(|a| a == "--config") {
        if pos + 1 >= args.len() {
            usage(&program);
            return Ok(());
        }
        let path = args.remove(pos + 1);
        args.remove(pos);
        config = ProcessorConfig::load(&path)?;
        log::info!("loaded configuration from {}", path);
    }

    if args.len() < 2 || args.len() > 3 {
        usage(&program);
        return Ok(());
    }

    let table = loader::load_lookup(&args[0])?;
    let sheets = loader::load_patterns(&args[1])?;
    let report = scan_sheets(&sheets, &table, &config);

    let unresolved = all_rows(&report.results)
        .filter(|row| !row.found_in_lookup)
        .count();
    if unresolved > 0 {
        log::warn!("{} row(s) could not be resolved and are marked with '*'", unresolved);
    }

    match args.get(2) {
        Some(output) if output.ends_with(".bin.gz") => {
            saving::save_snapshot(&saving::Snapshot::new(report.results.clone()), output)?;
            log::info!("saved snapshot to {}", output);
        }
        Some(output) => downloader::export(&report.results, output)?,
        None => println!("{}", downloader::to_csv(&report.results)?),
    }

    log::info!(
        "{} pattern(s) from {} sheet(s), {} cell(s) scanned, {} row(s) generated in {:.2}s",
        report.summary.total_patterns,
        report.summary.sheets_analyzed,
        report.summary.cells_scanned,
        all_rows(&report.results).count(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
