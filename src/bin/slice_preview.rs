use std::env;
use std::path::Path;
use volume_stitcher::image::io::{load_volume, save_slice_png};
use volume_stitcher::volume::Plane;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let [info, plane, index, out] = args.as_slice() else {
        return Err(usage());
    };
    let plane = parse_plane(plane)?;
    let index: usize = index
        .parse()
        .map_err(|e| format!("Invalid slice index {index}: {e}"))?;

    let volume = load_volume(Path::new(info)).map_err(|e| e.to_string())?;
    let slice = volume.slice_u8(plane, index).map_err(|e| e.to_string())?;
    save_slice_png(&slice, Path::new(out)).map_err(|e| e.to_string())?;
    println!(
        "{:?} slice {} of {} ({}x{}) written to {}",
        plane,
        index,
        volume.size(),
        slice.width(),
        slice.height(),
        out
    );
    Ok(())
}

fn parse_plane(arg: &str) -> Result<Plane, String> {
    if let Ok(id) = arg.parse::<u8>() {
        return Plane::from_id(id).ok_or_else(|| format!("Unknown plane id {id}"));
    }
    serde_json::from_value(serde_json::Value::String(arg.to_string()))
        .map_err(|_| format!("Unknown plane {arg}; expected 0-4 or sagittal, coronal, transverse, diagonal, anti_diagonal"))
}

fn usage() -> String {
    "Usage: slice_preview <info.json> <plane> <index> <out.png>".to_string()
}
