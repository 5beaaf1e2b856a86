//! Ordinary least squares trend of a yearly count, with a two-sided
//! p-value from the Student t distribution.

use clima_utils::numbers::round2;
use serde::Serialize;

/// p-values below this are reported as significant.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Unrounded least squares fit of y against x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_value: f64,
    pub p_value: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    pub fn is_significant(&self) -> bool {
        self.p_value < SIGNIFICANCE_LEVEL
    }
}

/// Fit `points` by least squares.
///
/// Needs at least two points with distinct x. With exactly two points the
/// fit is exact and the p-value is 0 (or 1 when both y are equal).
pub fn linear_fit(points: &[(f64, f64)]) -> Option<LinearFit> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let x_mean = points.iter().map(|(x, _)| x).sum::<f64>() / nf;
    let y_mean = points.iter().map(|(_, y)| y).sum::<f64>() / nf;
    let (mut ss_x, mut ss_y, mut ss_xy) = (0.0, 0.0, 0.0);
    for (x, y) in points {
        let dx = x - x_mean;
        let dy = y - y_mean;
        ss_x += dx * dx;
        ss_y += dy * dy;
        ss_xy += dx * dy;
    }
    if ss_x == 0.0 {
        return None;
    }

    let slope = ss_xy / ss_x;
    let intercept = y_mean - slope * x_mean;
    let r_value = if ss_y == 0.0 {
        0.0
    } else {
        (ss_xy / (ss_x * ss_y).sqrt()).clamp(-1.0, 1.0)
    };

    let p_value = if n == 2 {
        if points[0].1 == points[1].1 {
            1.0
        } else {
            0.0
        }
    } else {
        let df = (n - 2) as f64;
        let denominator = (1.0 - r_value) * (1.0 + r_value);
        if denominator <= f64::EPSILON {
            0.0
        } else {
            let t = r_value * (df / denominator).sqrt();
            students_t_two_sided(t, df)
        }
    };

    Some(LinearFit {
        slope,
        intercept,
        r_value,
        p_value,
    })
}

/// P(|T| >= |t|) for a Student t variable with `df` degrees of freedom.
pub fn students_t_two_sided(t: f64, df: f64) -> f64 {
    let x = df / (df + t * t);
    regularized_incomplete_beta(x, df / 2.0, 0.5).clamp(0.0, 1.0)
}

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the gamma function (Lanczos approximation).
fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let t = x + LANCZOS_G + 0.5;
    let series = LANCZOS_COEFFICIENTS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS_COEFFICIENTS[0], |acc, (i, c)| acc + c / (x + i as f64));
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
}

/// Regularized incomplete beta function I_x(a, b).
fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(x, a, b) / a
    } else {
        1.0 - front * beta_continued_fraction(1.0 - x, b, a) / b
    }
}

/// Modified Lentz evaluation of the incomplete beta continued fraction.
fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    const MAX_ITERATIONS: usize = 300;
    const EPSILON: f64 = 3e-16;
    const TINY: f64 = 1e-300;

    let guard = |v: f64| if v.abs() < TINY { TINY } else { v };
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - qab * x / qap);
    let mut h = d;
    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        let even = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / guard(1.0 + even * d);
        c = guard(1.0 + even / c);
        h *= d * c;

        let odd = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / guard(1.0 + odd * d);
        c = guard(1.0 + odd / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }
    h
}

/// A fitted value of the trend line.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FittedPoint {
    pub year: i32,
    pub frequency: f64,
}

/// Reported trend; numbers are rounded to two decimals, significance is
/// decided on the unrounded p-value.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendResult {
    pub slope: f64,
    pub intercept: f64,
    pub p_value: f64,
    pub significant: bool,
    pub fitted: Vec<FittedPoint>,
}

/// Serializes as the trend object, or as `{}` when no line was fitted.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Trend {
    Fitted(TrendResult),
    Empty {},
}

impl Trend {
    /// Fit a trend of `counts` against `years`.
    pub fn from_yearly(points: &[(i32, f64)]) -> Trend {
        let xy: Vec<(f64, f64)> = points.iter().map(|(year, y)| (f64::from(*year), *y)).collect();
        match linear_fit(&xy) {
            Some(fit) => Trend::Fitted(TrendResult {
                slope: round2(fit.slope),
                intercept: round2(fit.intercept),
                p_value: round2(fit.p_value),
                significant: fit.is_significant(),
                fitted: points
                    .iter()
                    .map(|(year, _)| FittedPoint {
                        year: *year,
                        frequency: round2(fit.at(f64::from(*year))),
                    })
                    .collect(),
            }),
            None => Trend::Empty {},
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Trend::Empty {})
    }
}
