//! Split a drawing into digits and write each normalized 28×28 frame as a PNG.
//!
//! ```text
//! RUST_LOG=inkdigits=debug cargo run --example recognize_png -- drawing.png [max_digits] [out_dir]
//! ```

use inkdigits::{ClusterConfig, Clusterizator, ImageNormalizer};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let input = args.next().ok_or("usage: recognize_png <drawing.png> [max_digits] [out_dir]")?;
    let max_digits: usize = match args.next() {
        Some(s) => s.parse()?,
        None => 10,
    };
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "digits".to_string()));
    std::fs::create_dir_all(&out_dir)?;

    let raster = image::open(&input)?.to_rgba8();
    let mut clusterizator = Clusterizator::from_image(&raster).with_config(ClusterConfig::default());
    println!("{} ink points", clusterizator.points().len());

    let clusters = clusterizator.clusterize_with_progress(true, max_digits, |p| {
        eprint!("\rscanning cluster counts: {p:3}%");
    })?;
    eprintln!();

    if clusters.is_empty() {
        println!("nothing to recognize");
        return Ok(());
    }

    let normalizer = ImageNormalizer::new();
    for (k, group) in clusters.iter().enumerate() {
        if group.is_empty() {
            continue;
        }
        let digit = normalizer.normalize(group)?;
        let path = out_dir.join(format!("digit_{k}.png"));
        digit.to_luma().save(&path)?;

        println!("cluster {k}: {} points -> {}", group.len(), path.display());
        for row in digit.pixels().rows() {
            let line: String = row.iter().map(|&v| if v > 0.0 { '#' } else { '.' }).collect();
            println!("  {line}");
        }
    }

    Ok(())
}
