//! Closed-form real-root solvers for monic polynomials of degree 2, 3 and 4.
//!
//! The quadratic and cubic follow the numerically stable forms from
//! "Numerical Recipes in C", section 5.6. The quartic factors into two
//! quadratics through a resolvent cubic and hands each factor to `quadratic`.

use crate::traits::{constant, Scalar};

/// Up to four real roots in ascending order, stored inline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Roots<T: Scalar> {
    values: [T; 4],
    len: usize,
}

impl<T: Scalar> Roots<T> {
    pub fn empty() -> Self {
        Self {
            values: [T::zero(); 4],
            len: 0,
        }
    }

    fn pair(pair: [T; 2]) -> Self {
        Self {
            values: [pair[0], pair[1], T::zero(), T::zero()],
            len: 2,
        }
    }

    fn quad(values: [T; 4]) -> Self {
        Self { values, len: 4 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.as_slice().iter().copied()
    }

    pub fn first(&self) -> Option<T> {
        self.as_slice().first().copied()
    }

    pub fn last(&self) -> Option<T> {
        self.as_slice().last().copied()
    }
}

/// Solves `x² + bx + c = 0`.
///
/// Returns the roots in ascending order, or `None` when the discriminant is
/// negative. One root comes from `-(b + sign(b)·√D) / 2`, which never
/// subtracts nearly equal values; the other is recovered as `c / x1`.
///
/// When `b = c = 0` the first root is zero and `c / x1` would be `0/0`; that
/// case is answered directly with the double root at zero. Any other
/// non-finite result (overflowing coefficients) is reported as `None`.
pub fn quadratic<T: Scalar>(b: T, c: T) -> Option<[T; 2]> {
    let two = constant::<T>(2.0);
    let disc = b * b - constant::<T>(4.0) * c;
    if disc < T::zero() {
        return None;
    }

    let x1 = -(b + b.signum() * disc.sqrt()) / two;
    if x1 == T::zero() {
        return Some([T::zero(), T::zero()]);
    }
    let x2 = c / x1;

    if !x1.is_finite() || !x2.is_finite() {
        return None;
    }

    Some([x1.min(x2), x1.max(x2)])
}

/// Returns the largest real root of `x³ + a1·x² + a2·x + a3`.
///
/// Three real roots (`q³ ≥ r²`, ties included) use the trigonometric form;
/// otherwise the single real root comes from Cardano's formula.
pub fn cubic_max_root<T: Scalar>(a1: T, a2: T, a3: T) -> T {
    let two = constant::<T>(2.0);
    let three = constant::<T>(3.0);

    let a1 = a1 / three;
    let q = a1 * a1 - a2 / three;
    let r = a1 * a1 * a1 + (a3 - a1 * a2) / two;

    let q3 = q * q * q;
    if q3 >= r * r {
        // q = 0 forces r = 0: a triple root, where acos(r / √q³) is 0/0.
        if q <= T::zero() {
            return -a1;
        }

        let cos_theta = (r / q3.sqrt()).max(-T::one()).min(T::one());
        let theta = cos_theta.acos();
        let scale = -two * q.sqrt();
        let turn = two * constant::<T>(std::f64::consts::PI);

        let x1 = scale * (theta / three).cos() - a1;
        let x2 = scale * ((theta + turn) / three).cos() - a1;
        let x3 = scale * ((theta - turn) / three).cos() - a1;

        x1.max(x2).max(x3)
    } else {
        let temp = ((r * r - q3).sqrt() + r.abs()).cbrt();
        -r.signum() * (temp + q / temp) - a1
    }
}

/// Returns the real roots of `x⁴ + a·x³ + b·x² + c·x + d`, ascending.
///
/// The result always holds 0, 2 or 4 roots.
#[allow(clippy::many_single_char_names)]
pub fn quartic<T: Scalar>(a: T, b: T, c: T, d: T) -> Roots<T> {
    // Write the quartic as (x² + px + q)(x² + rx + s). Matching coefficients:
    //     a = p + r,  b = pr + q + s,  c = ps + qr,  d = qs.
    //
    // With α = a/2 and t = (p - r)/2 we have pr = α² - t², and eliminating
    // q and s leaves a cubic in u = t²:
    //     u³ + (2·tmp1 - α²)·u² + (tmp1² - 2α·tmp2 - 4d)·u - tmp2² = 0
    // where tmp1 = b - α² and tmp2 = α·tmp1 - c.
    //
    // The cubic is -tmp2² ≤ 0 at u = 0, so its largest root is non-negative.
    let two = constant::<T>(2.0);
    let four = constant::<T>(4.0);

    let alpha = a / two;
    let tmp1 = b - alpha * alpha;
    let tmp2 = alpha * tmp1 - c;

    let u = cubic_max_root(
        two * tmp1 - alpha * alpha,
        tmp1 * tmp1 - two * alpha * tmp2 - four * d,
        -tmp2 * tmp2,
    );
    // Rounding can push a zero root slightly negative.
    let t = u.max(T::zero()).sqrt();

    let p = alpha + t;
    let r = alpha - t;
    let q_plus_s = b - p * r;

    let (q, s) = if t > T::zero() {
        let q_minus_s = (alpha * q_plus_s - c) / t;
        ((q_plus_s + q_minus_s) / two, (q_plus_s - q_minus_s) / two)
    } else {
        // p = r, so q and s are only pinned down by their sum and product.
        match quadratic(-q_plus_s, d) {
            Some([q, s]) => (q, s),
            None => {
                log::trace!("quartic has no real quadratic split");
                return Roots::empty();
            }
        }
    };

    match (quadratic(p, q), quadratic(r, s)) {
        (Some(lhs), Some(rhs)) => {
            // Both pairs are already ordered, so four comparisons suffice.
            let lowest = lhs[0].min(rhs[0]);
            let low = lhs[0].max(rhs[0]);
            let high = lhs[1].min(rhs[1]);
            let highest = lhs[1].max(rhs[1]);

            Roots::quad([lowest, low.min(high), low.max(high), highest])
        }
        (Some(pair), None) | (None, Some(pair)) => Roots::pair(pair),
        (None, None) => Roots::empty(),
    }
}
