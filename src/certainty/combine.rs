/// Round `value` to `precision` decimal digits.
#[must_use]
pub fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10_f64.powf(f64::from(precision));
    (value * scale).round() / scale
}

/// Combine two certainty factors concluding the same atom.
///
/// - both positive: `x + y - xy`
/// - both negative: `x + y + xy`
/// - equal magnitudes: `0`
/// - otherwise: `(x + y) / (1 - min(|x|, |y|))`
///
/// The result is rounded to `precision` digits. The operation is commutative.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn aggregate(x: f64, y: f64, precision: u32) -> f64 {
    if x > 0.0 && y > 0.0 {
        return round_to(x + y - x * y, precision);
    }
    if x < 0.0 && y < 0.0 {
        return round_to(x + y + x * y, precision);
    }
    if x.abs() == y.abs() {
        return 0.0;
    }
    round_to((x + y) / (1.0 - x.abs().min(y.abs())), precision)
}
