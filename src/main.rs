use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pixsig::config::{AppConfig, ConfigStore};
use pixsig::signal::{ScanPipeline, ScanPipelineConfig, SignalBlock};
use pixsig::video::convert::{self, supported_pairs, PixelConverter};
use pixsig::video::{ImageRef, PatternKind, PixelFormat, Resolution, TestPattern};

/// Log level for the application
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Verbose,
    Debug,
    Trace,
}

/// pixsig command line arguments
#[derive(Parser, Debug)]
#[command(name = "pixsig")]
#[command(version, about = "Pixel format transcoding and pixel-to-signal scanning", long_about = None)]
struct CliArgs {
    /// Log level (error, warn, info, verbose, debug, trace)
    #[arg(short = 'l', long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Increase verbosity (-v for verbose, -vv for debug, -vvv for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a raw frame file between pixel formats
    Convert {
        /// Source pixel format
        #[arg(long, value_name = "FORMAT")]
        from: PixelFormat,
        /// Destination pixel format
        #[arg(long, value_name = "FORMAT")]
        to: PixelFormat,
        /// Frame width
        #[arg(long)]
        width: u32,
        /// Frame height
        #[arg(long)]
        height: u32,
        /// Raw input frame
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
        /// Raw output frame
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
        /// Convert within the input buffer (permutations only)
        #[arg(long)]
        in_place: bool,
    },

    /// List supported conversions
    Formats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan a test pattern into a signal stream
    ///
    /// Mode commands such as `mode waterfall 10` are read from stdin while
    /// running.
    Scan {
        /// Configuration file (created with defaults when missing)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Run time in seconds
        #[arg(short, long, default_value_t = 5.0)]
        duration: f64,
        /// Override the frame format
        #[arg(long, value_name = "FORMAT")]
        format: Option<PixelFormat>,
        /// Override the test pattern
        #[arg(long)]
        pattern: Option<PatternKind>,
        /// Initial mode command, e.g. "waterfall 3"
        #[arg(short, long, value_name = "COMMAND")]
        mode: Option<String>,
        /// Dump every block as a JSON line instead of logging levels
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = CliArgs::parse();

    // Initialize logging with CLI arguments
    init_logging(args.log_level, args.verbose);

    match args.command {
        Command::Convert {
            from,
            to,
            width,
            height,
            input,
            output,
            in_place,
        } => {
            run_convert(
                from,
                to,
                Resolution::new(width, height),
                input,
                output,
                in_place,
            )
            .await
        }
        Command::Formats { json } => run_formats(json),
        Command::Scan {
            config,
            duration,
            format,
            pattern,
            mode,
            json,
        } => {
            let mut app_config = match config {
                Some(path) => (*ConfigStore::new(&path).await?.get()).clone(),
                None => AppConfig::default(),
            };
            if let Some(format) = format {
                app_config.video.format = format;
            }
            if let Some(pattern) = pattern {
                app_config.video.pattern = pattern;
            }
            run_scan(app_config, duration, mode, json).await
        }
    }
}

async fn run_convert(
    from: PixelFormat,
    to: PixelFormat,
    resolution: Resolution,
    input: PathBuf,
    output: PathBuf,
    in_place: bool,
) -> anyhow::Result<()> {
    let mut data = tokio::fs::read(&input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let converter = PixelConverter::new(from, to, resolution)?;
    let converted = if in_place {
        data.resize(data.len().max(converter.output_len()), 0);
        converter.convert_in_place(&mut data)?;
        data.truncate(converter.output_len());
        data
    } else {
        let image = ImageRef::new(from, resolution, &data)?;
        let mut out = vec![0u8; converter.output_len()];
        convert::convert(&image, to, &mut out)?;
        out
    };

    tokio::fs::write(&output, &converted)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    tracing::info!(
        "Converted {} {} → {} ({} bytes) into {}",
        from,
        resolution,
        to,
        converted.len(),
        output.display()
    );
    Ok(())
}

#[derive(Serialize)]
struct PairInfo {
    src: PixelFormat,
    dst: PixelFormat,
}

fn run_formats(json: bool) -> anyhow::Result<()> {
    let pairs = supported_pairs();
    if json {
        let infos: Vec<PairInfo> = pairs
            .into_iter()
            .map(|(src, dst)| PairInfo { src, dst })
            .collect();
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    for &src in PixelFormat::all() {
        let targets: Vec<String> = pairs
            .iter()
            .filter(|(s, d)| *s == src && *d != src)
            .map(|(_, d)| d.to_string())
            .collect();
        println!("{:<8} → {}", src.to_string(), targets.join(", "));
    }
    Ok(())
}

async fn run_scan(
    config: AppConfig,
    duration: f64,
    mode: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let source = TestPattern::try_from(&config.video)?;
    let pipeline = ScanPipeline::new(ScanPipelineConfig::from(&config))?;
    if let Some(mode) = mode {
        pipeline.command(&mode)?;
    }

    let mut blocks = pipeline.subscribe();
    pipeline.start(Box::new(source))?;
    tracing::info!(
        "Scanning {} {} {} pattern ({:?}) for {:.1}s",
        config.video.pattern,
        config.video.format,
        config.video.resolution(),
        config.video.orientation,
        duration
    );

    let stdin_task = tokio::spawn(read_commands(pipeline.clone()));
    let deadline = tokio::time::sleep(Duration::from_secs_f64(duration.max(0.0)));
    tokio::pin!(deadline);

    // Log levels roughly ten times a second
    let log_every = (config.stream.sample_rate as usize / config.stream.block_size / 10).max(1);
    let mut received = 0usize;

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            block = blocks.recv() => match block {
                Ok(block) => {
                    received += 1;
                    if json {
                        println!("{}", serde_json::to_string(&*block)?);
                    } else if received % log_every == 0 {
                        log_levels(&block);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Signal consumer lagged by {} blocks", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    stdin_task.abort();
    pipeline.stop();

    let stats = pipeline.stats();
    tracing::info!(
        "Scan ended: {} frames delivered, {} dropped, {} blocks ({} silent), {:.1}s",
        stats.frames_delivered,
        stats.frames_dropped,
        stats.blocks_produced,
        stats.silent_blocks,
        stats.running_time_secs
    );
    Ok(())
}

/// Forward stdin lines to the pipeline as mode commands
async fn read_commands(pipeline: Arc<ScanPipeline>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match pipeline.command(&line) {
                Ok(()) => tracing::info!("Applied '{}'", line.trim()),
                Err(e) => tracing::warn!("Rejected '{}': {}", line.trim(), e),
            },
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read stdin: {}", e);
                break;
            }
        }
    }
}

fn log_levels(block: &SignalBlock) {
    let [r, g, b, a] = block.peak();
    tracing::info!(
        "peak r={:.3} g={:.3} b={:.3} a={:.3} ({} samples)",
        r,
        g,
        b,
        a,
        block.len()
    );
}

fn init_logging(level: LogLevel, verbose_count: u8) {
    // Verbose count overrides log level
    let effective_level = match verbose_count {
        0 => level,
        1 => LogLevel::Verbose,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    // Build filter string based on effective level
    let filter = match effective_level {
        LogLevel::Error => "pixsig=error",
        LogLevel::Warn => "pixsig=warn",
        LogLevel::Info => "pixsig=info",
        LogLevel::Verbose => "pixsig=debug",
        LogLevel::Debug => "pixsig=debug,tokio=debug",
        LogLevel::Trace => "pixsig=trace,tokio=debug",
    };

    // Environment variable takes highest priority
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    // Logs go to stderr so JSON dumps on stdout stay clean
    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
    {
        eprintln!("failed to initialize tracing: {}", err);
    }
}
