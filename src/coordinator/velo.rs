//! Velocity (Theil-Sen extrapolation) selection policy.

use crate::coordinator::policy::Decision;
use crate::coordinator::stats::theil_sen;
use crate::Value;

/// Fits both histories, anchors each line at its own sample midpoint, and
/// extrapolates forward to absolute position `horizon = |a| + |b| - 2`
/// (i.e. `horizon - mid` steps past each line's own midpoint). Winner is
/// whichever worker's projected low bound clears the other's projected high
/// bound; otherwise no decision.
pub fn decide(
    a_index: usize,
    a_history: &[Value],
    b_index: usize,
    b_history: &[Value],
    confidence: f64,
) -> Decision {
    let horizon = (a_history.len() + b_history.len()).saturating_sub(2) as f64;

    let project = |history: &[Value]| -> (f64, f64) {
        let fit = theil_sen(history, confidence);
        let mid = (history.len() - 1) as f64 / 2.0;
        let anchor = fit.intercept + fit.slope * mid;
        let distance = horizon - mid;
        let y_lo = anchor + fit.slope_lo * distance;
        let y_hi = anchor + fit.slope_hi * distance;
        if y_lo <= y_hi {
            (y_lo, y_hi)
        } else {
            (y_hi, y_lo)
        }
    };

    let (a_lo, a_hi) = project(a_history);
    let (b_lo, b_hi) = project(b_history);

    if a_lo > b_hi {
        Decision::Pick {
            winner: a_index,
            loser: b_index,
        }
    } else if b_lo > a_hi {
        Decision::Pick {
            winner: b_index,
            loser: a_index,
        }
    } else {
        Decision::NoDecision
    }
}
