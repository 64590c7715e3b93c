mod error;
mod normalizer;
mod output;
mod reader;
mod record;

use anyhow::{Context, Result};
use clap::Parser;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PACCT_VIEW_LOG";

/// Print the records of a paccountant log with `Cmdline` split into arguments
/// and `When` parsed as a timestamp.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(value_name = "FILE", default_value = "paccountant.log")]
    file: PathBuf,

    /// stdout, debug, jsonl, or a .json/.jsonl/.ndjson path
    #[arg(short, long, default_value = "stdout")]
    output: String,

    /// Print a one-line summary to stderr when done
    #[arg(long)]
    stats: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let start_time = Instant::now();
    let (file, file_size) = open_log(&args.file)?;
    tracing::info!(path = %args.file.display(), bytes = file_size, "reading log");

    let mut writer = output::create_writer(&args.output)?;

    let stats = if file_size == 0 {
        reader::Stats::default()
    } else {
        // The mapping is only read; paccountant appends but never truncates.
        let mmap = unsafe { Mmap::map(&file)? };
        reader::process(&mmap, &mut writer)?
    };
    writer.finish()?;

    tracing::info!(
        lines = stats.lines,
        records = stats.records,
        skipped = stats.skipped,
        "done"
    );
    if args.stats {
        eprintln!(
            "{}: {} in {:.3}s",
            args.file.display(),
            stats,
            start_time.elapsed().as_secs_f64()
        );
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn open_log(path: &Path) -> Result<(File, u64)> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let size = file
        .metadata()
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();
    Ok((file, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn args_defaults() {
        let args = Args::parse_from(["pacct-view"]);
        assert_eq!(args.file, PathBuf::from("paccountant.log"));
        assert_eq!(args.output, "stdout");
        assert!(!args.stats);
    }

    #[test]
    fn args_explicit() {
        let args = Args::parse_from(["pacct-view", "-o", "out.jsonl", "--stats", "/var/log/pacct.log"]);
        assert_eq!(args.file, PathBuf::from("/var/log/pacct.log"));
        assert_eq!(args.output, "out.jsonl");
        assert!(args.stats);
    }

    #[test]
    fn missing_log_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paccountant.log");
        let err = open_log(&path).unwrap_err();
        assert!(format!("{:#}", err).contains(&path.display().to_string()));
    }

    #[test]
    fn mapped_file_is_processed() {
        let mut log = tempfile::NamedTempFile::new().unwrap();
        writeln!(log, "{{\"Cmdline\":\"true\\u0000\"}}").unwrap();
        writeln!(log, "{{}}").unwrap();

        let (file, size) = open_log(log.path()).unwrap();
        assert!(size > 0);
        let mmap = unsafe { Mmap::map(&file).unwrap() };
        let mut writer = output::Writer::Jsonl(Vec::new());
        let stats = reader::process(&mmap, &mut writer).unwrap();
        assert_eq!(stats.records, 1);
        assert_eq!(stats.skipped, 1);

        let out = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(out, "{\"Cmdline\":[\"true\"]}\n");
    }
}
