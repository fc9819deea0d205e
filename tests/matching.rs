use image::GrayImage;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sgm_rs::{
    compute_disp, is_valid, CensusSize, MatcherState, SemiGlobalMatcher, SgmError, SgmOption,
    INVALID_FLOAT,
};

fn random_texture(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..width * height).map(|_| rng.random()).collect()
}

/// Right view of a fronto-parallel scene at disparity `shift`: the right
/// pixel `(y, x)` sees the left pixel `(y, x + shift)`.
fn shifted_right(left: &[u8], width: usize, shift: usize) -> Vec<u8> {
    let mut right = vec![0u8; left.len()];
    for (row_l, row_r) in left.chunks(width).zip(right.chunks_mut(width)) {
        row_r[..width - shift].copy_from_slice(&row_l[shift..]);
    }
    right
}

fn option_5x5(num_paths: u8) -> SgmOption {
    SgmOption {
        min_disparity: 0,
        max_disparity: 16,
        census_size: CensusSize::Census5x5,
        num_paths,
        ..SgmOption::default()
    }
}

fn run(width: usize, height: usize, option: SgmOption, left: &[u8], right: &[u8]) -> Vec<f32> {
    let mut matcher = SemiGlobalMatcher::new(width as u32, height as u32, option).unwrap();
    let mut disp = vec![0f32; width * height];
    matcher.match_pair(left, right, &mut disp).unwrap();
    disp
}

/// Fraction of interior pixels within 0.5 of `shift`, and their mean
/// absolute error with invalid pixels counted as `shift`.
fn interior_accuracy(disp: &[f32], width: usize, height: usize, shift: f32) -> (f32, f32) {
    let mut good = 0;
    let mut abs_err = 0.0;
    let mut total = 0;
    for y in 3..height - 3 {
        for x in 8..width - 8 {
            let d = disp[y * width + x];
            total += 1;
            if is_valid(d) {
                abs_err += (d - shift).abs();
                if (d - shift).abs() <= 0.5 {
                    good += 1;
                }
            } else {
                abs_err += shift;
            }
        }
    }
    (good as f32 / total as f32, abs_err / total as f32)
}

#[test]
fn uniform_pair_has_no_confident_disparity() {
    let (width, height) = (32, 24);
    let img = vec![128u8; width * height];
    let disp = run(width, height, option_5x5(8), &img, &img);
    assert!(disp.iter().all(|&d| !is_valid(d) || d.abs() < 1.0));
}

#[test]
fn constant_shift_is_recovered() {
    let (width, height) = (64, 64);
    let left = random_texture(width, height, 11);
    let right = shifted_right(&left, width, 5);
    let disp = run(width, height, option_5x5(4), &left, &right);
    let (accuracy, _) = interior_accuracy(&disp, width, height, 5.0);
    assert!(accuracy >= 0.9, "accuracy {accuracy}");
}

#[test]
fn nine_by_seven_census_recovers_shift() {
    let (width, height) = (64, 48);
    let left = random_texture(width, height, 23);
    let right = shifted_right(&left, width, 7);
    let option = SgmOption {
        census_size: CensusSize::Census9x7,
        ..option_5x5(8)
    };
    let disp = run(width, height, option, &left, &right);
    let (accuracy, _) = interior_accuracy(&disp, width, height, 7.0);
    assert!(accuracy >= 0.9, "accuracy {accuracy}");
}

#[test]
fn eight_paths_are_no_worse_than_four() {
    let (width, height) = (64, 64);
    let left = random_texture(width, height, 29);
    let right = shifted_right(&left, width, 6);
    let disp4 = run(width, height, option_5x5(4), &left, &right);
    let disp8 = run(width, height, option_5x5(8), &left, &right);
    let (acc4, mae4) = interior_accuracy(&disp4, width, height, 6.0);
    let (acc8, mae8) = interior_accuracy(&disp8, width, height, 6.0);
    assert!(acc4 >= 0.9 && acc8 >= 0.9, "accuracy {acc4} / {acc8}");
    assert!(mae8 <= mae4 + 0.1, "mae {mae4} / {mae8}");
}

/// Number of 4-neighbour pairs of valid pixels whose disparities differ by
/// more than one.
fn disparity_jumps(disp: &Array2<f32>) -> usize {
    let mut jumps = 0;
    for ((y, x), &d) in disp.indexed_iter() {
        if !is_valid(d) {
            continue;
        }
        for (ny, nx) in [(y + 1, x), (y, x + 1)] {
            if let Some(&n) = disp.get((ny, nx)) {
                if is_valid(n) && (n - d).abs() > 1.0 {
                    jumps += 1;
                }
            }
        }
    }
    jumps
}

#[test]
fn larger_p2_never_adds_disparity_jumps() {
    let (width, height) = (64, 48);
    for seed in [3, 8, 13] {
        // Low-contrast texture keeps |ΔI| small so the adaptive P2 stays
        // close to `p2_init`.
        let mut rng = StdRng::seed_from_u64(seed);
        let left: Vec<u8> = (0..width * height).map(|_| rng.random_range(96..100u8)).collect();
        let mut right = shifted_right(&left, width, 4);
        for v in right.iter_mut() {
            if rng.random_bool(0.3) {
                *v = rng.random_range(96..100u8);
            }
        }

        let jumps = |p2_init: i32| {
            let option = SgmOption {
                p2_init,
                is_check_unique: false,
                is_check_lr: false,
                is_remove_speckles: false,
                is_fill_holes: false,
                ..option_5x5(8)
            };
            let mut matcher =
                SemiGlobalMatcher::new(width as u32, height as u32, option).unwrap();
            let mut disp = vec![0f32; width * height];
            matcher.match_pair(&left, &right, &mut disp).unwrap();
            disparity_jumps(matcher.disparity_unfiltered().unwrap())
        };
        let (rough, smooth) = (jumps(30), jumps(120));
        assert!(smooth <= rough, "seed {seed}: {rough} jumps at P2 30, {smooth} at 120");
    }
}

#[test]
fn ramp_against_flat_image_is_rejected_by_lr_check() {
    let (width, height) = (64, 64);
    let left: Vec<u8> = (0..height)
        .flat_map(|y| (0..width).map(move |x| ((x + y) * 2) as u8))
        .collect();
    let right = vec![100u8; width * height];
    let mut matcher = SemiGlobalMatcher::new(width as u32, height as u32, option_5x5(8)).unwrap();
    let mut disp = vec![0f32; width * height];
    matcher.match_pair(&left, &right, &mut disp).unwrap();

    let invalid = disp.iter().filter(|&&d| !is_valid(d)).count();
    assert!(invalid * 2 > disp.len(), "{invalid} invalid of {}", disp.len());
    assert!(!matcher.occlusions().is_empty() || !matcher.mismatches().is_empty());
}

#[test]
fn disparities_stay_strictly_inside_search_range() {
    let (width, height) = (40, 30);
    for seed in 0..4 {
        let left = random_texture(width, height, seed);
        let right = random_texture(width, height, seed + 100);
        let option = SgmOption {
            min_disparity: -6,
            max_disparity: 10,
            census_size: CensusSize::Census5x5,
            ..SgmOption::default()
        };
        let disp = run(width, height, option, &left, &right);
        for &d in &disp {
            assert!(d == INVALID_FLOAT || (d > -6.0 && d < 9.0), "disparity {d}");
        }
    }
}

#[test]
fn output_buffer_is_only_written_by_successful_match() {
    let (width, height) = (16, 12);
    let mut matcher = SemiGlobalMatcher::new(width, height, option_5x5(4)).unwrap();
    let mut disp = vec![-3.0f32; (width * height) as usize];
    let short = vec![0u8; 10];
    let img = vec![0u8; (width * height) as usize];
    assert!(matches!(
        matcher.match_pair(&short, &img, &mut disp),
        Err(SgmError::BufferSizeMismatch { .. })
    ));
    assert!(disp.iter().all(|&d| d == -3.0));

    matcher.release();
    matcher.release();
    assert_eq!(matcher.state(), MatcherState::Uninitialized);
    assert!(matches!(
        matcher.match_pair(&img, &img, &mut disp),
        Err(SgmError::NotInitialized)
    ));
}

#[test]
fn image_helper_matches_gray_buffers() {
    let (width, height) = (48u32, 40u32);
    let left_raw = random_texture(width as usize, height as usize, 41);
    let right_raw = shifted_right(&left_raw, width as usize, 4);
    let left = GrayImage::from_raw(width, height, left_raw).unwrap();
    let right = GrayImage::from_raw(width, height, right_raw).unwrap();
    let disp = compute_disp(&left, &right, &option_5x5(8)).unwrap();
    assert_eq!(disp.dimensions(), (width, height));
    let center = disp.get_pixel(width / 2, height / 2)[0];
    assert!((center - 4.0).abs() <= 0.5, "center disparity {center}");
}

#[test]
fn options_deserialize_with_defaults() {
    let json = r#"{ "max_disparity": 128, "census_size": "Census5x5", "num_paths": 4 }"#;
    let option: SgmOption = serde_json::from_str(json).unwrap();
    assert_eq!(option.max_disparity, 128);
    assert_eq!(option.census_size, CensusSize::Census5x5);
    assert_eq!(option.num_paths, 4);
    assert_eq!(option.p1, SgmOption::default().p1);
    assert!(option.validate().is_ok());
}
