use anyhow::{Context, Result};
use chunkfold::output::write_document;
use chunkfold::{
    EmptyRecordPolicy, IngestConfig, IngestReport, ParseFailurePolicy, TruncatedTailPolicy,
    UserRecord, ingest_file, ingest_reader,
};
use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(
    name = "chunkfold",
    version,
    about = "Fold a delimited user file into a JSON document keyed by user name"
)]
struct Args {
    /// Input file; `-` or nothing reads stdin. Compressed files are detected.
    input: Option<PathBuf>,

    /// JSON file with ingestion settings; flags below override it.
    #[arg(long, env = "CHUNKFOLD_CONFIG")]
    config: Option<PathBuf>,

    /// Bytes per window read.
    #[arg(long)]
    window_size: Option<usize>,

    /// Record delimiter.
    #[arg(long)]
    delimiter: Option<char>,

    /// Field separator.
    #[arg(long)]
    separator: Option<char>,

    #[arg(long, value_enum)]
    empty_records: Option<EmptyArg>,

    #[arg(long, value_enum)]
    truncated_tail: Option<TailArg>,

    #[arg(long, value_enum)]
    on_parse_error: Option<ParseErrorArg>,

    /// Abort when a single record grows beyond this many bytes.
    #[arg(long)]
    max_record_len: Option<usize>,

    /// Parse large batches in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Write skipped records to this file as JSON.
    #[arg(long)]
    rejects: Option<PathBuf>,

    /// Print ingestion counters to stderr.
    #[arg(long, default_value_t = false)]
    metrics: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EmptyArg {
    Skip,
    Reject,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TailArg {
    Error,
    Accept,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ParseErrorArg {
    FailFast,
    Skip,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run(Args::parse()) {
        eprintln!("{}: {err:#}", env!("CARGO_PKG_NAME"));
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = build_config(&args)?;
    log::debug!("ingesting with {config:?}");

    let report = match args.input.as_deref() {
        Some(path) if path.as_os_str() != "-" => ingest_file(path, &config)?,
        _ => ingest_reader(io::stdin().lock(), &config).context("ingest stdin")?,
    };

    emit(&args, &report, io::stdout().lock())
}

fn build_config(args: &Args) -> Result<IngestConfig> {
    let mut config = match &args.config {
        Some(path) => IngestConfig::from_json_file(path)?,
        None => IngestConfig::default(),
    };
    if let Some(n) = args.window_size {
        config = config.with_window_size(n);
    }
    if let Some(c) = args.delimiter {
        config = config.with_delimiter(c);
    }
    if let Some(c) = args.separator {
        config = config.with_separator(c);
    }
    if let Some(policy) = args.empty_records {
        config = config.with_empty_records(match policy {
            EmptyArg::Skip => EmptyRecordPolicy::Skip,
            EmptyArg::Reject => EmptyRecordPolicy::Reject,
        });
    }
    if let Some(policy) = args.truncated_tail {
        config = config.with_truncated_tail(match policy {
            TailArg::Error => TruncatedTailPolicy::Error,
            TailArg::Accept => TruncatedTailPolicy::Accept,
        });
    }
    if let Some(policy) = args.on_parse_error {
        config = config.with_parse_failure(match policy {
            ParseErrorArg::FailFast => ParseFailurePolicy::FailFast,
            ParseErrorArg::Skip => ParseFailurePolicy::SkipAndLog,
        });
    }
    if args.max_record_len.is_some() {
        config = config.with_max_record_len(args.max_record_len);
    }
    if args.parallel {
        config = config.with_parallel_parse(true);
    }
    config.validate()?;
    Ok(config)
}

/// Write the rejects file, then the document, then the stderr summaries.
///
/// A rejects file that cannot be written fails the run before any of the
/// document reaches `out`.
fn emit<W: Write>(args: &Args, report: &IngestReport<UserRecord>, out: W) -> Result<()> {
    if let Some(path) = &args.rejects {
        report
            .rejects
            .write_to_file(path)
            .with_context(|| format!("write rejects to {}", path.display()))?;
    }
    write_document(&report.registry, out)?;
    if args.rejects.is_none() && !report.rejects.is_empty() {
        report.rejects.print();
    }
    if args.metrics {
        report.metrics.print();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn report_with_reject() -> Result<IngestReport<UserRecord>> {
        let input = "alice,Alice,Smith,a@x.com\nbroken\n";
        Ok(ingest_reader(input.as_bytes(), &IngestConfig::default())?)
    }

    #[test]
    fn unwritable_rejects_file_leaves_stdout_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("no-such-dir").join("rejects.json");
        let args = Args::try_parse_from([
            OsStr::new("chunkfold"),
            OsStr::new("--rejects"),
            missing.as_os_str(),
        ])?;
        let mut out = Vec::new();
        let err = emit(&args, &report_with_reject()?, &mut out).unwrap_err();
        assert!(format!("{err:#}").contains("write rejects to"));
        assert!(out.is_empty());
        Ok(())
    }

    #[test]
    fn rejects_file_and_document_are_both_written() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("rejects.json");
        let args = Args::try_parse_from([
            OsStr::new("chunkfold"),
            OsStr::new("--rejects"),
            path.as_os_str(),
        ])?;
        let mut out = Vec::new();
        emit(&args, &report_with_reject()?, &mut out)?;
        let doc: serde_json::Value = serde_json::from_slice(&out)?;
        assert!(doc.get("alice").is_some());
        let rejects: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(rejects[0]["raw"], "broken");
        Ok(())
    }
}
