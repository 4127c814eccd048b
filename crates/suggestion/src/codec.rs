//! Wire codec for Hyperband state.
//!
//! The Manager's suggestion-parameter store is a schemaless list of
//! name/value strings, so the state is flattened into one entry per field:
//! floats as fixed 4-decimal, integers as decimal, the trial-id list
//! comma-joined (empty list encodes as the empty string). Unknown names are
//! logged and skipped on decode; unparseable numerics are treated as unset
//! and fall back to the derived defaults.

use hypertune_domain::SuggestionParameter;
use hypertune_errors::{TuneError, TuneResult};
use tracing::warn;

use crate::state::{HyperbandState, RawHyperbandState};

const ETA: &str = "eta";
const S_MAX: &str = "sMax";
const B_L: &str = "b_l";
const R_L: &str = "r_l";
const R: &str = "r";
const N: &str = "n";
const SH_LOOP_ITR: &str = "shloopitr";
const CURRENT_S: &str = "currentS";
const RESOURCE_NAME: &str = "ResourceName";
const OBJECTIVE_VALUE_NAME: &str = "ObjectiveValueName";
const EVALUATING_TRIALS: &str = "evaluatingTrials";

pub fn encode(state: &HyperbandState) -> Vec<SuggestionParameter> {
    vec![
        SuggestionParameter::new(ETA, format!("{:.4}", state.eta)),
        SuggestionParameter::new(S_MAX, state.s_max.to_string()),
        SuggestionParameter::new(B_L, format!("{:.4}", state.b_l)),
        SuggestionParameter::new(R_L, format!("{:.4}", state.r_l)),
        SuggestionParameter::new(R, format!("{:.4}", state.r)),
        SuggestionParameter::new(SH_LOOP_ITR, state.shloopitr.to_string()),
        SuggestionParameter::new(N, state.n.to_string()),
        SuggestionParameter::new(CURRENT_S, state.current_s.to_string()),
        SuggestionParameter::new(RESOURCE_NAME, state.resource_name.clone()),
        SuggestionParameter::new(
            OBJECTIVE_VALUE_NAME,
            state.objective_value_name.clone(),
        ),
        SuggestionParameter::new(EVALUATING_TRIALS, state.evaluating_trials.join(",")),
    ]
}

/// Decodes the parameter list into a raw record. Required-field validation
/// (`r_l`, `ResourceName`) happens here; default derivation is deferred to
/// [`RawHyperbandState::resolve`] so the caller can fill the objective name
/// from the study first.
pub fn decode(params: &[SuggestionParameter]) -> TuneResult<RawHyperbandState> {
    let mut raw = RawHyperbandState::default();
    for sp in params {
        match sp.name.as_str() {
            ETA => raw.eta = parse_float(sp),
            R_L => raw.r_l = parse_float(sp),
            B_L => raw.b_l = parse_float(sp),
            R => raw.r = parse_float(sp),
            S_MAX => raw.s_max = parse_int(sp),
            N => raw.n = parse_int(sp),
            SH_LOOP_ITR => raw.shloopitr = parse_int(sp),
            CURRENT_S => raw.current_s = parse_int(sp),
            RESOURCE_NAME => raw.resource_name = sp.value.clone(),
            OBJECTIVE_VALUE_NAME => raw.objective_value_name = sp.value.clone(),
            EVALUATING_TRIALS => {
                if !sp.value.is_empty() {
                    raw.evaluating_trials =
                        sp.value.split(',').map(str::to_string).collect();
                }
            }
            unknown => warn!("unknown suggestion parameter {unknown}"),
        }
    }
    if raw.r_l.map_or(true, |r_l| r_l <= 0.0) || raw.resource_name.is_empty() {
        return Err(TuneError::config_error("r_l and ResourceName must be set"));
    }
    Ok(raw)
}

fn parse_float(sp: &SuggestionParameter) -> Option<f64> {
    match sp.value.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("unparseable value {:?} for {}", sp.value, sp.name);
            None
        }
    }
}

fn parse_int(sp: &SuggestionParameter) -> Option<i32> {
    match sp.value.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("unparseable value {:?} for {}", sp.value, sp.name);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp(name: &str, value: &str) -> SuggestionParameter {
        SuggestionParameter::new(name, value)
    }

    #[test]
    fn test_decode_minimal_then_resolve_defaults() {
        let params = vec![sp("r_l", "81"), sp("eta", "3"), sp("ResourceName", "epochs")];
        let state = decode(&params).unwrap().resolve().unwrap();
        assert_eq!(state.s_max, 4);
        assert_eq!(state.b_l, 405.0);
        assert_eq!(state.n, 81);
        assert_eq!(state.r, 1.0);
        assert_eq!(state.current_s, 4);
        assert_eq!(state.shloopitr, 0);
        assert_eq!(state.resource_name, "epochs");
        assert!(state.evaluating_trials.is_empty());
    }

    #[test]
    fn test_decode_missing_r_l_fails() {
        let err = decode(&[sp("ResourceName", "epochs")]).unwrap_err();
        assert!(matches!(err, TuneError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_decode_nonpositive_r_l_fails() {
        let params = vec![sp("r_l", "0"), sp("ResourceName", "epochs")];
        assert!(decode(&params).is_err());
    }

    #[test]
    fn test_decode_missing_resource_name_fails() {
        assert!(decode(&[sp("r_l", "81")]).is_err());
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        let params = vec![
            sp("r_l", "81"),
            sp("ResourceName", "epochs"),
            sp("no_such_field", "whatever"),
        ];
        let raw = decode(&params).unwrap();
        assert_eq!(raw.r_l, Some(81.0));
    }

    #[test]
    fn test_unparseable_numeric_is_treated_as_unset() {
        let params = vec![
            sp("r_l", "81"),
            sp("ResourceName", "epochs"),
            sp("sMax", "four"),
        ];
        let raw = decode(&params).unwrap();
        assert_eq!(raw.s_max, None);
        // Resolution falls back to the derived default.
        assert_eq!(raw.resolve().unwrap().s_max, 4);
    }

    #[test]
    fn test_empty_trial_list_decodes_to_empty_vec() {
        let params = vec![
            sp("r_l", "81"),
            sp("ResourceName", "epochs"),
            sp("evaluatingTrials", ""),
        ];
        assert!(decode(&params).unwrap().evaluating_trials.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let state = HyperbandState {
            eta: 3.0,
            s_max: 4,
            b_l: 405.0,
            r_l: 81.0,
            r: 1.0,
            n: 81,
            shloopitr: 2,
            current_s: 4,
            resource_name: "epochs".to_string(),
            objective_value_name: "accuracy".to_string(),
            evaluating_trials: vec!["t1".to_string(), "t2".to_string(), "t3".to_string()],
        };
        let decoded = decode(&encode(&state)).unwrap().resolve().unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_round_trip_empty_trials() {
        let state = HyperbandState {
            eta: 3.0,
            s_max: 4,
            b_l: 405.0,
            r_l: 81.0,
            r: 1.0,
            n: 81,
            shloopitr: 0,
            current_s: 4,
            resource_name: "epochs".to_string(),
            objective_value_name: "accuracy".to_string(),
            evaluating_trials: vec![],
        };
        let encoded = encode(&state);
        let trials = encoded
            .iter()
            .find(|p| p.name == "evaluatingTrials")
            .unwrap();
        assert_eq!(trials.value, "");
        assert_eq!(decode(&encoded).unwrap().resolve().unwrap(), state);
    }

    #[test]
    fn test_wire_formats() {
        let state = HyperbandState {
            eta: 3.0,
            s_max: 4,
            b_l: 405.0,
            r_l: 81.0,
            r: 0.3333,
            n: 81,
            shloopitr: 0,
            current_s: 4,
            resource_name: "epochs".to_string(),
            objective_value_name: "accuracy".to_string(),
            evaluating_trials: vec!["t1".to_string(), "t2".to_string()],
        };
        let encoded = encode(&state);
        let value = |name: &str| {
            encoded
                .iter()
                .find(|p| p.name == name)
                .map(|p| p.value.clone())
                .unwrap()
        };
        assert_eq!(value("eta"), "3.0000");
        assert_eq!(value("b_l"), "405.0000");
        assert_eq!(value("r"), "0.3333");
        assert_eq!(value("sMax"), "4");
        assert_eq!(value("currentS"), "4");
        assert_eq!(value("evaluatingTrials"), "t1,t2");
    }
}
