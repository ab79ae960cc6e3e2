//! Explicit feature values for a single prediction.

use execflag_frame::Formula;
use serde::{Deserialize, Serialize};

use crate::EvalError;

/// One minute bar to classify.
///
/// Fields map onto the columns `WAP`, `Volume`, `Count`, `Minute`,
/// `Tesla3`, `Tesla6`, `Tesla9` and `Decision`. `decision` is optional;
/// a formula that uses `Decision` fails to project without it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Weighted average price.
    pub wap: f64,
    /// Traded volume.
    pub volume: f64,
    /// Number of trades.
    pub count: f64,
    /// Minute of the hour.
    pub minute: f64,
    /// Indicator over 3 bars.
    pub tesla3: f64,
    /// Indicator over 6 bars.
    pub tesla6: f64,
    /// Indicator over 9 bars.
    pub tesla9: f64,
    /// Buy (1), hold (0) or sell (-1) decision.
    pub decision: Option<f64>,
}

impl Observation {
    /// Return the value for a column name, if this observation carries it.
    #[must_use]
    pub fn value(&self, column: &str) -> Option<f64> {
        match column {
            "WAP" => Some(self.wap),
            "Volume" => Some(self.volume),
            "Count" => Some(self.count),
            "Minute" => Some(self.minute),
            "Tesla3" => Some(self.tesla3),
            "Tesla6" => Some(self.tesla6),
            "Tesla9" => Some(self.tesla9),
            "Decision" => self.decision,
            _ => None,
        }
    }

    /// Return the formula's predictor values, in formula order.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::MissingFeature`] for the first predictor this
    /// observation cannot supply.
    pub fn project(&self, formula: &Formula) -> Result<Vec<f64>, EvalError> {
        formula
            .predictors()
            .iter()
            .map(|name| {
                self.value(name)
                    .ok_or_else(|| EvalError::MissingFeature { name: name.clone() })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(decision: Option<f64>) -> Observation {
        Observation {
            wap: 0.66,
            volume: 120.0,
            count: 12.0,
            minute: 20.0,
            tesla3: 0.1,
            tesla6: 0.2,
            tesla9: 0.3,
            decision,
        }
    }

    #[test]
    fn projects_in_formula_order() {
        let values = bar(Some(-1.0)).project(&Formula::execute_flag()).unwrap();
        assert_eq!(values, vec![0.66, 12.0, 20.0, 0.1, 0.2, 0.3, -1.0]);
    }

    #[test]
    fn missing_decision_is_reported() {
        match bar(None).project(&Formula::execute_flag()) {
            Err(EvalError::MissingFeature { name }) => assert_eq!(name, "Decision"),
            other => panic!("expected MissingFeature, got {other:?}"),
        }
    }

    #[test]
    fn unknown_predictor_is_missing() {
        let formula = Formula::new("EXECUTE", ["WAP", "Spread"]).unwrap();
        assert!(matches!(
            bar(None).project(&formula),
            Err(EvalError::MissingFeature { .. })
        ));
    }

    #[test]
    fn volume_is_available_without_decision() {
        let formula = Formula::new("EXECUTE", ["WAP", "Volume"]).unwrap();
        assert_eq!(bar(None).project(&formula).unwrap(), vec![0.66, 120.0]);
    }
}
