use crate::data::spectrum::Spectrum;

/// Produces candidate peak channels from a spectrum, strongest first.
pub trait PeakSearcher {
    fn search(&self, data: &Spectrum) -> Vec<usize>;
}

/// Prominence-based searcher: Gaussian-smooth a copy of the data, take
/// local maxima, keep those whose prominence clears a threshold, order by
/// apex height descending.
pub struct DerivativePeakSearcher {
    /// Gaussian smoothing sigma in channels.
    pub smoothing_sigma: f32,
    /// Minimum prominence relative to the spectrum maximum, 0..1.
    pub min_relative_prominence: f32,
}

impl Default for DerivativePeakSearcher {
    fn default() -> Self {
        DerivativePeakSearcher { smoothing_sigma: 1.5, min_relative_prominence: 0.01 }
    }
}

fn gaussian_kernel_1d(sigma: f32, truncate: f32) -> Vec<f32> {
    if sigma <= 0.0 { return Vec::new(); }
    let radius = (truncate * sigma).ceil() as i32;
    if radius < 1 { return Vec::new(); }
    let mut w = Vec::with_capacity((2 * radius + 1) as usize);
    let two_s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;
    for dx in -radius..=radius {
        let x = dx as f32;
        let val = (-x * x / two_s2).exp();
        w.push(val);
        sum += val;
    }
    if sum > 0.0 {
        for v in &mut w { *v /= sum; }
    }
    w
}

fn smooth(data: &[f32], sigma: f32) -> Vec<f32> {
    let kernel = gaussian_kernel_1d(sigma, 4.0);
    if kernel.is_empty() {
        return data.to_vec();
    }
    let rad = (kernel.len() / 2) as isize;
    let n = data.len() as isize;

    let mut out = vec![0.0f32; data.len()];
    for i in 0..n {
        let mut acc = 0.0f32;
        let mut norm = 0.0f32;
        for (off, &w) in kernel.iter().enumerate() {
            let j = i + off as isize - rad;
            if j < 0 || j >= n { continue; }
            acc += w * data[j as usize];
            norm += w;
        }
        out[i as usize] = if norm > 0.0 { acc / norm } else { 0.0 };
    }
    out
}

// prominence of a local maximum: apex height above the higher of the two
// valley minima found walking outward until a taller sample appears
fn prominence(y: &[f32], apex: usize) -> f32 {
    let y_apex = y[apex];

    let mut left_min = y_apex;
    let mut l = apex;
    while l > 0 {
        l -= 1;
        left_min = left_min.min(y[l]);
        if y[l] > y_apex { break; }
    }

    let mut right_min = y_apex;
    let mut r = apex;
    while r + 1 < y.len() {
        r += 1;
        right_min = right_min.min(y[r]);
        if y[r] > y_apex { break; }
    }

    y_apex - left_min.max(right_min)
}

impl PeakSearcher for DerivativePeakSearcher {
    fn search(&self, data: &Spectrum) -> Vec<usize> {
        let n = data.len();
        if n < 3 {
            return Vec::new();
        }

        let y = smooth(&data.intensities, self.smoothing_sigma);
        let max = y.iter().copied().fold(0.0f32, f32::max);
        if max <= 0.0 {
            return Vec::new();
        }
        let min_prom = self.min_relative_prominence * max;

        let mut peaks: Vec<(usize, f32)> = Vec::new();
        for i in 1..n - 1 {
            if y[i] > y[i - 1] && y[i] >= y[i + 1] && prominence(&y, i) >= min_prom {
                peaks.push((i, y[i]));
            }
        }

        peaks.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        peaks.into_iter().map(|(i, _)| i).collect()
    }
}
