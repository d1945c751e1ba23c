use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rusty_frame::data::loader;
use rusty_frame::{
    CellType, ColumnSelector, ColumnTypes, Condition, DataFrame, DedupView, RowSelector,
};

// ---------------------------------------------------------------------------
// Command-line options
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DedupMode {
    /// First occurrence of every row.
    Distinct,
    /// Rows that occur exactly once.
    Unique,
    /// First occurrence of every repeated row.
    Duplicated,
    /// Every occurrence of every repeated row.
    Repeated,
}

impl From<DedupMode> for DedupView {
    fn from(mode: DedupMode) -> Self {
        match mode {
            DedupMode::Distinct => DedupView::RemoveDuplicated,
            DedupMode::Unique => DedupView::Unique,
            DedupMode::Duplicated => DedupView::Duplicated,
            DedupMode::Repeated => DedupView::RemoveUnique,
        }
    }
}

/// Load a CSV, JSON or Parquet table, filter it and print the result.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Input file (.csv, .json, .parquet).
    file: PathBuf,

    /// Column types, as `name=type` pairs (`age=int,score=float`) or a JSON
    /// array/object.
    #[arg(long, value_name = "TYPES", value_parser = parse_types)]
    types: Option<ColumnTypes>,

    /// Columns to keep, comma-separated.
    #[arg(long, value_name = "COLS", value_delimiter = ',')]
    select: Vec<String>,

    /// Condition such as `age>=18`. Repeatable; all must hold.
    #[arg(long = "where", value_name = "EXPR")]
    conditions: Vec<String>,

    /// Half-open row range.
    #[arg(long, value_name = "FROM:TO", value_parser = parse_range, allow_hyphen_values = true)]
    rows: Option<(isize, isize)>,

    /// Keep only the rows of one dedup view.
    #[arg(long, value_enum)]
    dedup: Option<DedupMode>,

    /// Print JSON records instead of CSV.
    #[arg(long)]
    json: bool,
}

fn parse_types(raw: &str) -> Result<ColumnTypes> {
    let raw = raw.trim();
    if raw.starts_with('[') || raw.starts_with('{') {
        return serde_json::from_str(raw).context("parsing --types JSON");
    }
    let mut named = BTreeMap::new();
    for pair in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let (name, ty) = pair
            .split_once('=')
            .with_context(|| format!("expected name=type, got {pair:?}"))?;
        named.insert(name.trim().to_string(), ty.parse::<CellType>()?);
    }
    Ok(ColumnTypes::Named(named))
}

fn parse_range(raw: &str) -> Result<(isize, isize)> {
    let (from, to) = raw
        .split_once(':')
        .with_context(|| format!("expected FROM:TO, got {raw:?}"))?;
    Ok((
        from.trim().parse().context("parsing range start")?,
        to.trim().parse().context("parsing range end")?,
    ))
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

fn run(cli: &Cli) -> Result<()> {
    let mut df: DataFrame = loader::load_file(&cli.file)
        .with_context(|| format!("loading {}", cli.file.display()))?;

    if let Some(types) = &cli.types {
        df = df.parse(types)?;
    }
    if !cli.conditions.is_empty() {
        let conditions = Condition::parse_all(&cli.conditions)?;
        df = df.condition_rows(&conditions)?;
    }
    if let Some(mode) = cli.dedup {
        df = df.dedup(mode.into())?;
    }
    if !cli.select.is_empty() {
        let cols = cli.select.iter().map(|c| c.trim().to_string()).collect();
        df = df.subset_columns(&ColumnSelector::Names(cols))?;
    }
    if let Some((from, to)) = cli.rows {
        df = df.subset_rows(&RowSelector::Range { from, to })?;
    }

    let stdout = std::io::stdout().lock();
    if cli.json {
        serde_json::to_writer_pretty(stdout, &loader::to_json_records(&df))
            .context("writing JSON output")?;
        println!();
    } else {
        loader::write_csv(&df, stdout)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
