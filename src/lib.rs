/*!
# Power Whip Configurator

Turns compact receptacle patterns and free-form whip requests into
quantity-correct order rows in the "Master Bubble" layout.

## Overview

Input is a block of text, one pattern per line, in any mix of three shapes:

- delimited tuples: `CS8269A, LMZC, 20, 10, Red` or `460C9W MMC 115 10 red`
- quantity-suffixed tuples: `CS8269A, LMZC, 20, 10, Red !43`
- prose: `860 power whips, IEC pinned and sleeve plug, liquid tight,
  ranging from 20 to 25 feet. Colors: red, blue, green and yellow.`

Each input is resolved against a lookup table of receptacle
specifications and expanded into one row per whip.

## Pipeline

- **pattern**: line parser (tuples, `!N` quantities, prose detection)
- **natural**: rule-table interpreter for prose requests
- **lookup**: lookup records over loosely-keyed specification maps
- **resolver**: first-match receptacle resolution with `*` flagging
- **expansion**: row replication and equal distribution
- **expressions**: display-only formulas describing generated rows
- **processor**: drives the pipeline for text blocks and workbook scans

## Collaborators

- **loader**: lookup tables and pattern sheets from CSV / XLSX
- **downloader**: Master Bubble export to CSV / XLSX / JSON
- **saving**: run snapshots with gzip compression and bincode
- **config**: processing tunables, loadable from JSON

Nothing in the pipeline fails: unparseable input degrades to a best-effort
pattern and unknown receptacles become rows flagged with a `*` prefix.
*/

pub mod config;
pub mod downloader;
pub mod error;
pub mod expansion;
pub mod expressions;
pub mod loader;
pub mod lookup;
pub mod natural;
pub mod pattern;
pub mod processor;
pub mod resolver;
pub mod saving;

/// Re-export the pipeline entry points and data types
pub use config::ProcessorConfig;
pub use error::WhipError;
pub use expansion::{ExpandedRow, distribute};
pub use expressions::{Describe, Expression};
pub use lookup::{LookupRecord, LookupTable};
pub use natural::{NaturalLanguageSpec, interpret};
pub use pattern::{ParsedPattern, parse};
pub use processor::{
    PatternSheet, ProcessingResult, Processor, ScanReport, ScanSummary, process_block,
    process_block_with, scan_sheets,
};
pub use resolver::{Resolution, resolve};
