//! Hyperband state per `(study, param_id)` and its default derivation.

use hypertune_errors::{TuneError, TuneResult};
use tracing::debug;

const DEFAULT_ETA: f64 = 3.0;

/// Fully resolved Hyperband state. All numeric fields are concrete; unset
/// wire entries have already been replaced by derived defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperbandState {
    /// Reduction factor, > 1.
    pub eta: f64,
    /// Outer-loop maximum bracket index.
    pub s_max: i32,
    /// Total budget.
    pub b_l: f64,
    /// Maximum resource per trial.
    pub r_l: f64,
    /// Starting resource for the current outer bracket.
    pub r: f64,
    /// Initial bracket size for the current outer bracket.
    pub n: i32,
    /// Successive-halving inner-loop index.
    pub shloopitr: i32,
    /// Current outer-loop index, decremented toward 0.
    pub current_s: i32,
    pub resource_name: String,
    pub objective_value_name: String,
    /// Trial ids emitted by the previous round, in creation order.
    pub evaluating_trials: Vec<String>,
}

/// Decoded wire record. Absent or unparseable numeric entries are `None`;
/// [`RawHyperbandState::resolve`] derives the defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawHyperbandState {
    pub eta: Option<f64>,
    pub s_max: Option<i32>,
    pub b_l: Option<f64>,
    pub r_l: Option<f64>,
    pub r: Option<f64>,
    pub n: Option<i32>,
    pub shloopitr: Option<i32>,
    pub current_s: Option<i32>,
    pub resource_name: String,
    pub objective_value_name: String,
    pub evaluating_trials: Vec<String>,
}

impl RawHyperbandState {
    /// Derives defaults for every unset field and returns the resolved
    /// state. `r_l` and the resource-parameter name are required; `eta`
    /// must exceed 1 when given.
    pub fn resolve(self) -> TuneResult<HyperbandState> {
        let r_l = match self.r_l {
            Some(r_l) if r_l > 0.0 => r_l,
            _ => {
                return Err(TuneError::config_error(
                    "r_l and ResourceName must be set",
                ))
            }
        };
        if self.resource_name.is_empty() {
            return Err(TuneError::config_error(
                "r_l and ResourceName must be set",
            ));
        }
        let eta = match self.eta {
            None => DEFAULT_ETA,
            Some(eta) if eta <= 0.0 => DEFAULT_ETA,
            Some(eta) if eta <= 1.0 => {
                return Err(TuneError::config_error(format!(
                    "eta must be greater than 1, got {eta}"
                )))
            }
            Some(eta) => eta,
        };
        let s_max = self
            .s_max
            .unwrap_or_else(|| (r_l.ln() / eta.ln()).trunc() as i32);
        let b_l = self.b_l.unwrap_or_else(|| (s_max + 1) as f64 * r_l);
        let n = self.n.unwrap_or_else(|| {
            ((b_l / r_l) * (eta.powi(s_max) / (s_max + 1) as f64)).ceil() as i32
        });
        let current_s = self.current_s.unwrap_or(s_max);
        let shloopitr = self.shloopitr.unwrap_or(0);
        let r = self.r.unwrap_or_else(|| r_l * eta.powi(-s_max));

        let state = HyperbandState {
            eta,
            s_max,
            b_l,
            r_l,
            r,
            n,
            shloopitr,
            current_s,
            resource_name: self.resource_name,
            objective_value_name: self.objective_value_name,
            evaluating_trials: self.evaluating_trials,
        };
        debug!(
            "hyperband state: sMax={} b_l={} n={} r={} currentS={} shloopitr={} evaluating={:?}",
            state.s_max,
            state.b_l,
            state.n,
            state.r,
            state.current_s,
            state.shloopitr,
            state.evaluating_trials
        );
        Ok(state)
    }
}

impl HyperbandState {
    /// The schedule is exhausted once the outer index reaches 0.
    pub fn is_finished(&self) -> bool {
        self.current_s <= 0
    }

    /// The inner counter ran past the bracket size on the previous call, so
    /// the outer loop must recompute `n` and `r` before this round.
    pub fn needs_outer_rollover(&self) -> bool {
        self.shloopitr > self.current_s
    }

    /// Begin the next outer bracket: reset the inner counter and recompute
    /// the starting count and resource for the current `s`.
    pub fn advance_outer_loop(&mut self) {
        debug!("hyperband outer loop s = {}", self.current_s);
        self.shloopitr = 0;
        self.n = ((self.b_l / self.r_l)
            * (self.eta.powi(self.current_s) / (self.current_s + 1) as f64))
            .trunc() as i32;
        self.r = self.r_l * self.eta.powi(-self.current_s);
    }

    /// Count and resource for the current successive-halving round.
    pub fn round_parameters(&self) -> (i32, f64) {
        debug!("successive halving loop i = {}", self.shloopitr);
        let n_i = (self.n as f64 * self.eta.powi(-self.shloopitr)).trunc() as i32;
        let r_i = self.r * self.eta.powi(self.shloopitr);
        (n_i, r_i)
    }

    /// Advance the inner counter; when it passes the bracket size, step the
    /// outer index down. The outer recompute happens at the start of the
    /// next call via [`HyperbandState::advance_outer_loop`].
    pub fn advance_inner_loop(&mut self) {
        self.shloopitr += 1;
        if self.shloopitr > self.current_s {
            self.current_s -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(r_l: f64, eta: f64) -> RawHyperbandState {
        RawHyperbandState {
            eta: Some(eta),
            r_l: Some(r_l),
            resource_name: "epochs".to_string(),
            objective_value_name: "accuracy".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_derivation() {
        // r_l=81, eta=3 -> sMax=4, b_l=405, n=81, r=1, currentS=4, i=0
        let state = raw(81.0, 3.0).resolve().unwrap();
        assert_eq!(state.s_max, 4);
        assert_eq!(state.b_l, 405.0);
        assert_eq!(state.n, 81);
        assert_eq!(state.r, 1.0);
        assert_eq!(state.current_s, 4);
        assert_eq!(state.shloopitr, 0);
    }

    #[test]
    fn test_missing_r_l_fails() {
        let mut raw = raw(81.0, 3.0);
        raw.r_l = None;
        assert!(matches!(
            raw.resolve(),
            Err(TuneError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_missing_resource_name_fails() {
        let mut raw = raw(81.0, 3.0);
        raw.resource_name.clear();
        assert!(matches!(
            raw.resolve(),
            Err(TuneError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_eta_defaults_when_unset_or_nonpositive() {
        let mut unset = raw(81.0, 3.0);
        unset.eta = None;
        assert_eq!(unset.resolve().unwrap().eta, 3.0);

        let negative = raw(81.0, -1.0);
        assert_eq!(negative.resolve().unwrap().eta, 3.0);
    }

    #[test]
    fn test_eta_at_most_one_is_rejected() {
        assert!(matches!(
            raw(81.0, 1.0).resolve(),
            Err(TuneError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            raw(81.0, 0.5).resolve(),
            Err(TuneError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_explicit_fields_are_kept() {
        let mut raw = raw(81.0, 3.0);
        raw.s_max = Some(2);
        raw.current_s = Some(1);
        raw.shloopitr = Some(1);
        raw.n = Some(9);
        raw.r = Some(9.0);
        raw.b_l = Some(243.0);
        let state = raw.resolve().unwrap();
        assert_eq!(state.s_max, 2);
        assert_eq!(state.current_s, 1);
        assert_eq!(state.shloopitr, 1);
        assert_eq!(state.n, 9);
        assert_eq!(state.r, 9.0);
        assert_eq!(state.b_l, 243.0);
    }

    #[test]
    fn test_loop_advancement() {
        let mut state = raw(81.0, 3.0).resolve().unwrap();

        // Round 0 of the s=4 bracket: 81 trials at resource 1.
        assert_eq!(state.round_parameters(), (81, 1.0));
        state.advance_inner_loop();
        assert_eq!((state.shloopitr, state.current_s), (1, 4));

        // Round 1: 27 trials at resource 3.
        assert_eq!(state.round_parameters(), (27, 3.0));

        // Drive through the remaining rounds of the bracket.
        for _ in 1..=4 {
            state.advance_inner_loop();
        }
        assert_eq!((state.shloopitr, state.current_s), (5, 3));
        assert!(state.needs_outer_rollover());

        state.advance_outer_loop();
        assert_eq!(state.shloopitr, 0);
        assert_eq!(state.n, 33); // trunc(5 * 27 / 4)
        assert_eq!(state.r, 3.0);
    }

    #[test]
    fn test_is_finished() {
        let mut state = raw(81.0, 3.0).resolve().unwrap();
        assert!(!state.is_finished());
        state.current_s = 0;
        assert!(state.is_finished());
        state.current_s = -1;
        assert!(state.is_finished());
    }
}
