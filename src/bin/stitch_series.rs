use std::env;
use std::path::Path;
use volume_stitcher::config::load_config;
use volume_stitcher::image::io::{
    load_series, load_volume, save_slice_png, save_volume, write_json_file,
};
use volume_stitcher::volume::{Plane, VoxelVolume};
use volume_stitcher::StitchedSeries;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let volumes: Vec<VoxelVolume> = match &config.series {
        Some(root) => load_series(root).map_err(|e| e.to_string())?,
        None => config
            .inputs
            .iter()
            .map(|p| load_volume(p))
            .collect::<Result<_, _>>()
            .map_err(|e| e.to_string())?,
    };
    println!("Loaded {} volumes", volumes.len());
    for (i, vol) in volumes.iter().enumerate() {
        println!("  [{i}] {} range=[{}, {}]", vol.size(), vol.range().min, vol.range().max);
    }

    let stitcher = config.stitcher();
    let stitched = stitcher
        .stitch_series(&volumes)
        .map_err(|e| e.to_string())?;
    print_summary(&stitched);

    save_volume(&config.output.dir, &stitched.volume).map_err(|e| e.to_string())?;
    println!("Stitched volume written to {}", config.output.dir.display());

    if let Some(path) = &config.output.report_json {
        write_json_file(path, &stitched.report).map_err(|e| e.to_string())?;
        println!("JSON report written to {}", path.display());
    }

    if let Some(path) = &config.output.preview_png {
        let volume = &stitched.volume;
        let preview = volume
            .slice_u8(Plane::Sagittal, volume.size().x / 2)
            .map_err(|e| e.to_string())?;
        save_slice_png(&preview, path).map_err(|e| e.to_string())?;
        println!("Preview written to {}", path.display());
    }

    Ok(())
}

fn print_summary(stitched: &StitchedSeries) {
    println!("Stitch summary");
    println!("  result: {}", stitched.volume.size());
    println!("  total_ms: {:.1}", stitched.report.total_ms);
    for seam in &stitched.report.seams {
        let matches = seam.estimate.as_ref().map_or(0, |r| r.total_matches());
        println!(
            "  seam {}: offset {} placement z={} matches={} ({:.1} ms)",
            seam.index, seam.applied, seam.placement.z, matches, seam.elapsed_ms
        );
    }
}

fn usage() -> String {
    "Usage: stitch_series <config.json>".to_string()
}
