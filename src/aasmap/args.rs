use clap::{Parser, Subcommand};
use std::ops::RangeInclusive;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "aasmap")]
#[command(about = "Import Asset Administration Shell objects from spreadsheet rows", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding config.json (defaults to ./.aasmap, then the user config dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the template built from an object
    Show {
        /// Object document (JSON)
        object: PathBuf,
    },

    /// Print the import mapping of a template, optionally after applying one
    #[command(alias = "m")]
    Mapping {
        /// Object document (JSON)
        object: PathBuf,

        /// Mapping to apply first (JSON)
        #[arg(long, value_name = "FILE")]
        set: Option<PathBuf>,

        /// Print the mapping as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build one object from a single row
    #[command(alias = "p")]
    Preview {
        /// Object document (JSON)
        object: PathBuf,

        /// Mapping to apply (JSON)
        #[arg(short, long, value_name = "FILE")]
        mapping: Option<PathBuf>,

        /// Workbook (JSON)
        #[arg(short, long, value_name = "FILE")]
        workbook: PathBuf,

        /// Sheet to read
        #[arg(short, long)]
        sheet: Option<String>,

        /// 1-based row number (defaults to the first data row)
        #[arg(short, long)]
        row: Option<usize>,
    },

    /// Build one object per data row of a sheet
    #[command(alias = "i")]
    Import {
        /// Object document (JSON)
        object: PathBuf,

        /// Mapping to apply (JSON)
        #[arg(short, long, value_name = "FILE")]
        mapping: Option<PathBuf>,

        /// Workbook (JSON)
        #[arg(short, long, value_name = "FILE")]
        workbook: PathBuf,

        /// Sheet to read
        #[arg(short, long)]
        sheet: Option<String>,

        /// Rows to import as FIRST:LAST (defaults to every data row)
        #[arg(long, value_name = "FIRST:LAST", value_parser = parse_rows)]
        rows: Option<RangeInclusive<usize>>,

        /// Write the imported objects here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Report failing rows as warnings and keep going
        #[arg(long)]
        skip_failed: bool,
    },

    /// Write a default config.json
    Init,
}

fn parse_rows(text: &str) -> Result<RangeInclusive<usize>, String> {
    let (first, last) = text
        .split_once(':')
        .ok_or_else(|| format!("expected FIRST:LAST, got '{}'", text))?;
    let first: usize = first
        .trim()
        .parse()
        .map_err(|_| format!("bad first row '{}'", first))?;
    let last: usize = last
        .trim()
        .parse()
        .map_err(|_| format!("bad last row '{}'", last))?;
    if first == 0 || last < first {
        return Err(format!("'{}' is not a 1-based row range", text));
    }
    Ok(first..=last)
}
