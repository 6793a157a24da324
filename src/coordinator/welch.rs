//! Welch's-t-test selection policy.

use crate::coordinator::policy::Decision;
use crate::coordinator::stats::welchs_t_test;
use crate::Value;

/// `a`/`b` are the two workers' `value_history` samples; `a_index`/`b_index`
/// are their worker indices. If `p < p_threshold`, the worker with the
/// larger mean wins; otherwise the comparison is inconclusive.
pub fn decide(
    a_index: usize,
    a_history: &[Value],
    b_index: usize,
    b_history: &[Value],
    p_threshold: f64,
) -> Decision {
    let (p_value, mean_diff) = welchs_t_test(a_history, b_history);
    if p_value < p_threshold {
        if mean_diff > 0.0 {
            Decision::Pick {
                winner: a_index,
                loser: b_index,
            }
        } else {
            Decision::Pick {
                winner: b_index,
                loser: a_index,
            }
        }
    } else {
        Decision::NoDecision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clearly_better_worker_wins() {
        let a: Vec<Value> = (0..30).map(|i| 1000 + i).collect();
        let b: Vec<Value> = (0..30).collect();
        let decision = decide(0, &a, 1, &b, 0.05);
        assert_eq!(decision, Decision::Pick { winner: 0, loser: 1 });
    }

    #[test]
    fn indistinguishable_histories_yield_no_decision() {
        let a = vec![5; 20];
        let b = vec![5; 20];
        let decision = decide(0, &a, 1, &b, 0.05);
        assert_eq!(decision, Decision::NoDecision);
    }
}
