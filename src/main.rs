//! wcrt-bench command line.
//!
//! Reads task sets, evaluates each on the board and writes one row per
//! method to stdout or a file. Logs go to stderr.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use wcrt_bench::aggregate::aggregate;
use wcrt_bench::input::TaskSetReader;
use wcrt_bench::output::{RowFormat, RowWriter};
use wcrt_bench::recovery::RetryPolicy;
use wcrt_bench::transport::SerialChannel;
use wcrt_bench::{BenchError, SessionConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// Colon-separated text with a header line
    Csv,
    /// One JSON object per line
    Jsonl,
}

impl From<Format> for RowFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => RowFormat::Delimited,
            Format::Jsonl => RowFormat::JsonLines,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Session configuration file (JSON)
    config: PathBuf,

    /// Task sets, one JSON object per line; `-` reads stdin
    #[arg(short, long)]
    input: String,

    /// Write rows here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Row format
    #[arg(short, long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Override the serial port from the configuration
    #[arg(short, long)]
    port: Option<String>,

    /// Give up on a task set after this many failed exchanges
    #[arg(long)]
    max_attempts: Option<u32>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        return Err(e.into());
    }
    Ok(())
}

fn run(args: Args) -> Result<(), BenchError> {
    let mut config = SessionConfig::from_file(&args.config)?;
    if let Some(port) = args.port {
        config.target.port = port;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.recovery.retry = RetryPolicy::MaxAttempts { max_attempts };
    }

    let channel = SerialChannel::open(&config.target)?;
    let mut session = config.session_builder()?.build(channel)?;

    let input: Box<dyn BufRead> = if args.input == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(File::open(&args.input)?))
    };
    let output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };

    let mut writer = RowWriter::new(
        output,
        args.format.into(),
        session.metric_mode(),
        session.task_columns(),
    );

    let mut fatal = None;
    let mut skipped = 0usize;
    let evaluations = session
        .evaluations(TaskSetReader::new(input))
        .map_while(|result| match result {
            Ok(evaluation) => Some(Some(evaluation)),
            Err(e) if e.skips_task_set() => {
                tracing::warn!("Skipping task set: {}", e);
                skipped += 1;
                Some(None)
            }
            Err(e) => {
                fatal = Some(e);
                None
            }
        })
        .flatten();

    for row in aggregate(evaluations) {
        writer.write_row(&row)?;
    }

    let rows = writer.rows();
    writer.finish()?;

    tracing::info!(
        "Evaluated {} task sets, skipped {}, wrote {} rows",
        session.evaluated(),
        skipped,
        rows
    );

    match fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
