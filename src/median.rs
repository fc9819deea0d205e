use ndarray::Array2;

use crate::disparity::is_valid;

/// Median over a `wnd_size` x `wnd_size` window, ignoring invalid values.
///
/// A pixel whose window holds no valid value keeps its input value.
pub fn median_filter(input: &Array2<f32>, output: &mut Array2<f32>, wnd_size: usize) {
    let (height, width) = input.dim();
    let radius = wnd_size / 2;
    let mut wnd_data = Vec::with_capacity(wnd_size * wnd_size);

    for ((i, j), out) in output.indexed_iter_mut() {
        wnd_data.clear();
        for r in i.saturating_sub(radius)..(i + radius + 1).min(height) {
            for c in j.saturating_sub(radius)..(j + radius + 1).min(width) {
                let v = input[(r, c)];
                if is_valid(v) {
                    wnd_data.push(v);
                }
            }
        }
        *out = if wnd_data.is_empty() {
            input[(i, j)]
        } else {
            wnd_data.sort_by(f32::total_cmp);
            wnd_data[wnd_data.len() / 2]
        };
    }
}
