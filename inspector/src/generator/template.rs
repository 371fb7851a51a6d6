/// Radially symmetric Gaussian bump, 1.0 at the center.
pub fn gaussian(dx: f32, dy: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return if dx == 0.0 && dy == 0.0 { 1.0 } else { 0.0 };
    }
    let r2 = dx * dx + dy * dy;
    (-r2 / (2.0 * radius * radius)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaussian_peaks_at_center_and_decays() {
        assert_eq!(gaussian(0.0, 0.0, 3.0), 1.0);
        assert!(gaussian(3.0, 0.0, 3.0) < gaussian(1.0, 0.0, 3.0));
        assert_eq!(gaussian(1.0, 0.0, 0.0), 0.0);
    }
}
