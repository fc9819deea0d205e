extern crate image;
extern crate sgm_rs as sr;

use std::error::Error;
use std::fs;

use log::info;
use sr::{compute_disp, disparity_to_gray, SgmOption};

/// Usage: `stereo_pair [left.png] [right.png] [disp.png] [options.json]`
pub fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let arg = |i: usize, default: &str| args.get(i).cloned().unwrap_or_else(|| default.to_string());
    let left_path = arg(0, "demos/left.png");
    let right_path = arg(1, "demos/right.png");
    let out_path = arg(2, "demos/disp.png");

    let option = match args.get(3) {
        Some(path) => serde_json::from_str::<SgmOption>(&fs::read_to_string(path)?)?,
        None => SgmOption::new(0, 64),
    };
    info!("options: {:?}", option);

    let limg = image::open(&left_path)?.to_luma8();
    let rimg = image::open(&right_path)?.to_luma8();
    let disp = compute_disp(&limg, &rimg, &option)?;

    let valid = disp.pixels().filter(|p| sr::is_valid(p[0])).count();
    info!(
        "{} of {} pixels have a disparity",
        valid,
        disp.width() * disp.height()
    );
    disparity_to_gray(&disp).save(&out_path)?;
    info!("wrote {}", out_path);
    Ok(())
}
