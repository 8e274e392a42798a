//! Numerical helpers shared by the equilibrium and quasi-steady-state solvers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `sign(x)·|x|^n`.
///
/// Raising a negative base to an even or fractional power would either erase the sign
/// or produce NaN, so kinetic expressions with a signed driving force go through here.
pub fn signed_pow(x: f64, n: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x.signum() * x.abs().powf(n)
    }
}

/// Convergence settings for a bracketed root search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootSettings {
    /// Absolute step tolerance on the unknown
    pub absolute_tolerance: f64,
    /// Relative step tolerance on the unknown
    pub relative_tolerance: f64,
    /// Iteration budget
    pub max_iterations: usize,
}

impl Default for RootSettings {
    fn default() -> Self {
        Self {
            absolute_tolerance: 1e-12,
            relative_tolerance: 1e-10,
            max_iterations: 100,
        }
    }
}

impl RootSettings {
    fn converged(&self, step: f64, x: f64) -> bool {
        step.abs() <= self.absolute_tolerance + self.relative_tolerance * x.abs()
    }

    /// Same settings with both tolerances multiplied by `factor`.
    pub fn relaxed(&self, factor: f64) -> Self {
        Self {
            absolute_tolerance: self.absolute_tolerance * factor,
            relative_tolerance: self.relative_tolerance * factor,
            max_iterations: self.max_iterations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Root {
    pub x: f64,
    pub residual: f64,
    pub iterations: usize,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RootFailure {
    #[error("no sign change between f({lower})={f_lower} and f({upper})={f_upper}")]
    NotBracketed {
        lower: f64,
        upper: f64,
        f_lower: f64,
        f_upper: f64,
    },
    #[error("iteration budget of {iterations} exhausted at x={x} (residual {residual})")]
    IterationLimit {
        iterations: usize,
        x: f64,
        residual: f64,
    },
    #[error("non-finite residual at x={x}")]
    NonFinite { x: f64 },
}

/// Newton iteration safeguarded by bisection inside a bracket.
///
/// `f` returns the residual and its derivative. Newton steps that leave the current
/// bracket, or that do not halve the previous step, are replaced by bisection, so the
/// iteration converges whenever `[lower, upper]` brackets a root.
pub fn safeguarded_newton<F>(
    mut f: F,
    lower: f64,
    upper: f64,
    guess: Option<f64>,
    settings: &RootSettings,
) -> Result<Root, RootFailure>
where
    F: FnMut(f64) -> (f64, f64),
{
    let (f_lower, _) = f(lower);
    let (f_upper, _) = f(upper);
    if !f_lower.is_finite() {
        return Err(RootFailure::NonFinite { x: lower });
    }
    if !f_upper.is_finite() {
        return Err(RootFailure::NonFinite { x: upper });
    }
    if f_lower == 0.0 {
        return Ok(Root {
            x: lower,
            residual: 0.0,
            iterations: 0,
        });
    }
    if f_upper == 0.0 {
        return Ok(Root {
            x: upper,
            residual: 0.0,
            iterations: 0,
        });
    }
    if f_lower.signum() == f_upper.signum() {
        return Err(RootFailure::NotBracketed {
            lower,
            upper,
            f_lower,
            f_upper,
        });
    }

    // Orient the bracket so that f(x_neg) < 0 < f(x_pos)
    let (mut x_neg, mut x_pos) = if f_lower < 0.0 {
        (lower, upper)
    } else {
        (upper, lower)
    };
    let (lo, hi) = (lower.min(upper), lower.max(upper));
    let mut x = match guess {
        Some(g) if g > lo && g < hi => g,
        _ => 0.5 * (lower + upper),
    };
    let mut step_old = (upper - lower).abs();
    let mut step = step_old;
    let (mut fx, mut dfx) = f(x);
    if fx < 0.0 {
        x_neg = x;
    } else if fx > 0.0 {
        x_pos = x;
    }

    for iteration in 1..=settings.max_iterations {
        if !fx.is_finite() {
            return Err(RootFailure::NonFinite { x });
        }
        if fx == 0.0 {
            return Ok(Root {
                x,
                residual: 0.0,
                iterations: iteration - 1,
            });
        }

        let newton_leaves_bracket = ((x - x_pos) * dfx - fx) * ((x - x_neg) * dfx - fx) > 0.0;
        let newton_too_slow = (2.0 * fx).abs() > (step_old * dfx).abs();
        if !dfx.is_finite() || dfx == 0.0 || newton_leaves_bracket || newton_too_slow {
            step_old = step;
            step = 0.5 * (x_pos - x_neg);
            x = x_neg + step;
        } else {
            step_old = step;
            step = fx / dfx;
            x -= step;
        }

        if settings.converged(step, x) {
            let (residual, _) = f(x);
            return Ok(Root {
                x,
                residual,
                iterations: iteration,
            });
        }

        let (value, derivative) = f(x);
        fx = value;
        dfx = derivative;
        if fx < 0.0 {
            x_neg = x;
        } else {
            x_pos = x;
        }
    }

    Err(RootFailure::IterationLimit {
        iterations: settings.max_iterations,
        x,
        residual: fx,
    })
}

/// Grow the upper end of `[lower, upper]` geometrically until it brackets a sign change.
///
/// Returns the first upper bound whose residual has the opposite sign to `f(lower)`.
pub fn expand_upper_bracket<F>(
    mut f: F,
    lower: f64,
    upper: f64,
    factor: f64,
    max_expansions: usize,
) -> Result<f64, RootFailure>
where
    F: FnMut(f64) -> f64,
{
    let f_lower = f(lower);
    if !f_lower.is_finite() {
        return Err(RootFailure::NonFinite { x: lower });
    }
    let mut hi = upper;
    let mut f_hi = f(hi);
    for _ in 0..max_expansions {
        if !f_hi.is_finite() {
            return Err(RootFailure::NonFinite { x: hi });
        }
        if f_hi.signum() != f_lower.signum() || f_hi == 0.0 {
            return Ok(hi);
        }
        hi *= factor;
        f_hi = f(hi);
    }
    if f_hi.is_finite() && (f_hi.signum() != f_lower.signum() || f_hi == 0.0) {
        return Ok(hi);
    }
    Err(RootFailure::NotBracketed {
        lower,
        upper: hi,
        f_lower,
        f_upper: f_hi,
    })
}
