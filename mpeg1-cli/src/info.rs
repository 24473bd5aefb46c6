//! Stream header inspection.

use console::style;
use mpeg1_video::{probe_sequence_header, SequenceHeader};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Sequence headers are expected near the start of a stream.
const PROBE_BYTES: u64 = 1 << 20;

/// Read the first sequence header of `path`.
pub fn probe(path: &Path) -> anyhow::Result<SequenceHeader> {
    let mut data = Vec::new();
    File::open(path)?.take(PROBE_BYTES).read_to_end(&mut data)?;
    probe_sequence_header(&data).map_err(|e| {
        anyhow::anyhow!("No sequence header in the first {} bytes of {}: {}", PROBE_BYTES, path.display(), e)
    })
}

/// Print the sequence header parameters.
pub fn print(path: &Path, header: &SequenceHeader) {
    println!("{}", style("Sequence header:").cyan().bold());
    println!("  File:         {}", style(path.display()).white());
    println!("  Size:         {}x{}", style(header.width).white(), style(header.height).white());
    println!(
        "  Macroblocks:  {}x{}",
        style(header.mb_width()).white(),
        style(header.mb_height()).white()
    );
    match header.pixel_aspect_ratio() {
        Some(ratio) => println!("  Pel aspect:   {:.4} (code {})", style(ratio).white(), header.aspect_ratio_code),
        None => println!("  Pel aspect:   {} (code {})", style("reserved").yellow(), header.aspect_ratio_code),
    }
    match header.picture_rate() {
        Some(rate) => println!("  Picture rate: {:.3} fps", style(rate).white()),
        None => println!("  Picture rate: {} (code {})", style("reserved").yellow(), header.picture_rate_code),
    }
    match header.bit_rate_bps() {
        Some(bps) => println!("  Bit rate:     {} kbps", style(bps / 1000).white()),
        None => println!("  Bit rate:     {}", style("variable").white()),
    }
    println!("  VBV buffer:   {} kbit", style(u32::from(header.vbv_buffer_size) * 16).white());
    println!(
        "  Constrained:  {}",
        if header.constrained_parameters {
            style("yes").green()
        } else {
            style("no").white()
        }
    );
}
