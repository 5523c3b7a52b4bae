use clap::{Parser, ValueEnum};
use photomosaic::{
    HtmlRowSink, HttpTileFetcher, MosaicConfig, MosaicPipeline, MosaicReport, OffloadMode, TileSize,
    open_image, validate_upload,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const PAGE_HEAD: &str = "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Mosaic</title>\n\
<style>.mosaic-row{display:flex;line-height:0}</style></head>\n<body>\n<div id=\"imageOutput\">\n";
const PAGE_TAIL: &str = "</div>\n</body>\n</html>\n";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Offload {
    Inline,
    PerRow,
    Pool,
}

#[derive(Parser)]
#[command(name = "mosaic", about = "Render an image as a mosaic of server-supplied tiles")]
struct Args {
    /// Input image file
    input: Option<PathBuf>,
    /// Base URL of the tile server
    #[arg(short, long, default_value = "http://127.0.0.1:8765")]
    server: String,
    /// Tile width in pixels
    #[arg(long, default_value = "16")]
    tile_width: u32,
    /// Tile height in pixels
    #[arg(long, default_value = "16")]
    tile_height: u32,
    /// Where color reduction runs
    #[arg(long, value_enum, default_value = "per-row")]
    offload: Offload,
    /// Worker threads for `--offload pool` (0 = one per CPU)
    #[arg(long, default_value = "0")]
    workers: usize,
    /// Maximum simultaneous tile requests (unbounded when omitted)
    #[arg(long)]
    max_concurrent_fetches: Option<usize>,
    /// Per-request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout_secs: u64,
    /// Output HTML file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    // --- 1. Input Validation ---
    // Rejected input never reaches the pipeline.
    let (input, _format) = validate_upload(args.input.as_deref())?;

    // --- 2. Pipeline Initialization ---
    let config = MosaicConfig {
        tile_size: TileSize::new(args.tile_width, args.tile_height)?,
        offload: match args.offload {
            Offload::Inline => OffloadMode::Inline,
            Offload::PerRow => OffloadMode::PerRow,
            Offload::Pool => OffloadMode::Pool(args.workers),
        },
        max_concurrent_fetches: args.max_concurrent_fetches,
    };
    let fetcher = HttpTileFetcher::new(args.server, Duration::from_secs(args.timeout_secs));
    let pipeline = MosaicPipeline::new(config, fetcher)?;

    // --- 3. Decode ---
    let image = open_image(input)?;

    // --- 4. Render ---
    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    let mut sink = HtmlRowSink::new(writer);
    sink_write(&mut sink, PAGE_HEAD)?;
    let rendered = pipeline.render(&image, &mut sink).await;
    let report = close_page(&mut sink, rendered)?;
    tracing::info!(rows = report.rows, cols = report.cols, "Mosaic complete");
    Ok(())
}

/// Writes the page tail even after a failed render, so rows flushed before the
/// failure stay in a well-formed document. A render failure outranks a failure
/// to close the page.
fn close_page<W: Write>(
    sink: &mut HtmlRowSink<W>,
    rendered: photomosaic::Result<MosaicReport>,
) -> anyhow::Result<MosaicReport> {
    let tail = sink_write(sink, PAGE_TAIL);
    let report = rendered?;
    tail?;
    Ok(report)
}

fn sink_write<W: Write>(sink: &mut HtmlRowSink<W>, text: &str) -> io::Result<()> {
    let writer = sink.writer_mut();
    writer.write_all(text.as_bytes())?;
    writer.flush()
}
