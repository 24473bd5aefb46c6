//! mpeg1 - Decode MPEG-1 video elementary streams to raw YUV.

mod info;
mod reorder;

use anyhow::Context;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use mpeg1_video::{
    DecodeSummary, DecodedPicture, Mpeg1Decoder, Mpeg1DecoderConfig, Mpeg1Error, VideoRenderer,
};
use reorder::DisplayOrder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Command-line arguments for the decoder.
#[derive(Parser, Debug)]
#[command(name = "mpeg1")]
#[command(version)]
#[command(about = "Decode MPEG-1 video elementary streams")]
#[command(long_about = "Decodes an MPEG-1 video elementary stream (.m1v) to raw planar\n\
    YUV 4:2:0 (I420), one picture after another in display order.\n\n\
    EXAMPLES:\n    \
    mpeg1 -i clip.m1v -o clip.yuv\n    \
    mpeg1 -i clip.m1v -o first.yuv --frames 10\n    \
    mpeg1 -i clip.m1v --info")]
struct Args {
    /// Input elementary stream
    #[arg(short, long)]
    input: PathBuf,

    /// Output file for raw I420 pictures
    #[arg(short, long, required_unless_present = "info")]
    output: Option<PathBuf>,

    /// Stop after writing this many pictures
    #[arg(short = 'n', long)]
    frames: Option<u64>,

    /// Write pictures in coding order instead of display order
    #[arg(long)]
    coding_order: bool,

    /// Pictures buffered between the decoder thread and the writer
    #[arg(long, default_value = "3")]
    queue_depth: usize,

    /// Print the sequence header and exit
    #[arg(long)]
    info: bool,

    /// Verbose output (per-picture logging)
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Quiet mode (no progress, no summary)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Logs every sequence header the decoder meets.
struct LogRenderer;

impl VideoRenderer for LogRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        info!(width, height, "Picture size");
    }

    fn set_picture_rate(&mut self, code: u8) {
        match mpeg1_video::picture_rate(code) {
            Some(rate) => debug!(rate, "Picture rate"),
            None => debug!(code, "Reserved picture rate"),
        }
    }

    fn set_bit_rate(&mut self, bit_rate: u32) {
        debug!(bit_rate = u64::from(bit_rate) * 400, "Bit rate");
    }
}

/// Counters kept by the writer side.
#[derive(Debug, Default)]
struct WriteStats {
    pictures: u64,
    bytes: u64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if !args.quiet {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(if args.verbose {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            })
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    if args.info {
        let header = info::probe(&args.input)?;
        info::print(&args.input, &header);
        return Ok(());
    }

    let output_path = args
        .output
        .as_ref()
        .context("An output path is required")?;
    let input = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let output = File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    let mut output = BufWriter::new(output);

    let config = Mpeg1DecoderConfig::default().with_queue_capacity(args.queue_depth);
    let start = Instant::now();
    let (pictures, handle) = Mpeg1Decoder::spawn(input, LogRenderer, config)?;

    let progress = if args.quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} pictures {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let mut stats = WriteStats::default();
    let mut write = |picture: &DecodedPicture| -> anyhow::Result<bool> {
        if args.frames.is_some_and(|limit| stats.pictures >= limit) {
            return Ok(false);
        }
        picture.write_i420(&mut output)?;
        stats.pictures += 1;
        stats.bytes += picture.i420_size() as u64;
        if let Some(pb) = &progress {
            pb.set_position(stats.pictures);
            pb.set_message(format!("({} {})", picture.picture_type(), picture.temporal_reference()));
        }
        debug!(
            picture_type = %picture.picture_type(),
            temporal_reference = picture.temporal_reference(),
            decode_index = picture.decode_index(),
            "Wrote picture"
        );
        Ok(true)
    };

    let mut order = DisplayOrder::new();
    let mut stopped = false;
    for picture in &pictures {
        let due = if args.coding_order {
            Some(picture)
        } else {
            order.push(picture)
        };
        if let Some(picture) = due {
            if !write(&picture)? {
                stopped = true;
                break;
            }
        }
    }
    if !stopped {
        if let Some(picture) = order.finish() {
            write(&picture)?;
        }
    }
    output.flush()?;
    drop(pictures);

    let result = handle
        .join()
        .map_err(|_| anyhow::anyhow!("Decoder thread panicked"))?;
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    let summary = match result {
        Ok(summary) => Some(summary),
        // The writer stopped early on --frames.
        Err(Mpeg1Error::OutputClosed) if stopped => None,
        Err(e) => {
            eprintln!("{} {}", style("Decode error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    if !args.quiet {
        print_summary(&stats, summary.as_ref(), start.elapsed(), output_path);
    }
    Ok(())
}

fn print_summary(stats: &WriteStats, summary: Option<&DecodeSummary>, elapsed: Duration, output: &Path) {
    println!("{}", style("Decoding complete!").green().bold());
    println!();
    println!("{}", style("Statistics:").cyan().bold());
    if let Some(summary) = summary {
        println!(
            "  Pictures:     {} (I {}, P {}, B {}, D {})",
            style(summary.pictures()).white(),
            summary.intra_pictures,
            summary.predictive_pictures,
            summary.bidirectional_pictures,
            summary.dc_pictures
        );
        println!("  Groups:       {}", style(summary.groups_of_pictures).white());
        if !summary.reached_end_code {
            println!("  {}", style("Stream ended without a sequence end code").yellow());
        }
    }
    println!("  Written:      {} pictures, {} bytes", style(stats.pictures).white(), stats.bytes);
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        println!("  Speed:        {:.1} fps", stats.pictures as f64 / secs);
    }
    println!("  Time:         {:.2}s", secs);
    println!();
    println!("{} {}", style("Output saved to:").white(), style(output.display()).green().bold());
}
