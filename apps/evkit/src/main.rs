use std::path::{Path as FsPath, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use evkit_coerce::{CoerceOptions, Conversion, EpochUnit, TimeZone, TimestampFormat, TypeHints};
use evkit_value::{Event, Path};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "evkit")]
#[command(about = "Apply type hints to newline-delimited JSON events")]
struct Cli {
    /// JSON file with `format`, `timezone`, `epoch_unit` and `hints`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Zone for timestamps without an offset: `local`, an IANA name, or `+HH:MM`.
    #[arg(long)]
    timezone: Option<TimeZone>,
    /// `auto`, `rfc3339`, `rfc2822`, `unix`, or a strftime pattern.
    #[arg(long)]
    format: Option<TimestampFormat>,
    /// Unit of integer epochs: s, ms, us or ns.
    #[arg(long)]
    epoch_unit: Option<EpochUnit>,
    /// Field hint such as `http.status=int` or `ts=timestamp|%d/%m/%Y`. Repeatable.
    #[arg(long = "hint", value_name = "PATH=TYPE", value_parser = TypeHints::parse_assignment)]
    hints: Vec<(Path, Conversion)>,
    /// Abort on the first event that fails to decode or coerce.
    #[arg(long)]
    strict: bool,
    /// Input file; stdin when omitted.
    input: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Config {
    format: Option<TimestampFormat>,
    timezone: Option<TimeZone>,
    epoch_unit: Option<EpochUnit>,
    hints: TypeHints,
}

impl Config {
    async fn load(path: &FsPath) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// Command-line flags override the config file; repeated hints for one path
/// keep the last.
fn resolve(cli: &Cli, config: Config) -> (CoerceOptions, TypeHints) {
    let mut options = CoerceOptions::default();
    if let Some(format) = cli.format.clone().or(config.format) {
        options = options.with_format(format);
    }
    if let Some(timezone) = cli.timezone.or(config.timezone) {
        options = options.with_timezone(timezone);
    }
    if let Some(unit) = cli.epoch_unit.or(config.epoch_unit) {
        options = options.with_epoch_unit(unit);
    }
    let mut hints = config.hints;
    hints.merge(cli.hints.iter().cloned().collect());
    (options, hints)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Stats {
    processed: u64,
    emitted: u64,
    dropped: u64,
}

fn process_line(raw: &[u8], hints: &TypeHints, options: &CoerceOptions) -> Result<Event> {
    let line = std::str::from_utf8(raw).context("line is not valid UTF-8")?;
    let mut event = Event::from_json(line).context("decoding event")?;
    let coerced = hints
        .apply(&mut event, options)
        .context("applying type hints")?;
    debug!(fields = event.len(), coerced, "event coerced");
    Ok(event)
}

async fn run<R, W>(
    input: R,
    output: W,
    hints: &TypeHints,
    options: &CoerceOptions,
    strict: bool,
) -> Result<Stats>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(input);
    let mut out = BufWriter::new(output);
    let mut stats = Stats::default();
    let mut number = 0u64;
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(error) => {
                out.flush().await.context("writing output")?;
                return Err(error).context(format!("reading input after line {number}"));
            }
        }
        number += 1;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        stats.processed += 1;
        match process_line(&line, hints, options) {
            Ok(event) => {
                out.write_all(event.to_json_string().as_bytes()).await?;
                out.write_all(b"\n").await?;
                stats.emitted += 1;
            }
            Err(error) if strict => {
                out.flush().await?;
                return Err(error.context(format!("line {number}")));
            }
            Err(error) => {
                warn!(line = number, error = %format!("{error:#}"), "event dropped");
                stats.dropped += 1;
            }
        }
    }
    out.flush().await.context("writing output")?;
    Ok(stats)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path).await?,
        None => Config::default(),
    };
    let (options, hints) = resolve(&cli, config);
    info!(
        format = %options.format,
        timezone = %options.timezone,
        epoch_unit = ?options.epoch_unit,
        hints = hints.len(),
        "coercion configured"
    );

    let stdout = tokio::io::stdout();
    let stats = match &cli.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;
            run(file, stdout, &hints, &options, cli.strict).await?
        }
        None => run(tokio::io::stdin(), stdout, &hints, &options, cli.strict).await?,
    };

    info!(
        processed = stats.processed,
        emitted = stats.emitted,
        dropped = stats.dropped,
        "input exhausted"
    );
    Ok(())
}
