//! Train, test, leave-one-out evaluation and single-row prediction.

use std::path::{Path, PathBuf};

use execflag_frame::{Formula, Frame, stack};
use execflag_io::FrameReader;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::learner::{Classifier, Learner, integral_labels, predictor_rows};
use crate::{
    EvalError, EvaluationResult, Observation, Prediction, RowFilter, SeedSequence, TrainingSummary,
};

/// Files, formula, filters, hyperparameters and seeds for a [`Harness`].
///
/// `training` parameters fit the model kept by [`Harness::train`];
/// `validation` parameters fit every leave-one-out fold.
#[derive(Debug)]
pub struct HarnessConfig<P> {
    train_path: PathBuf,
    test_path: Option<PathBuf>,
    formula: Formula,
    filters: Vec<RowFilter>,
    training: P,
    validation: P,
    seeds: SeedSequence,
    delimiter: u8,
}

impl<P> HarnessConfig<P> {
    /// Create a config with no testing file, no filters, the fixed seed
    /// table and comma-delimited input.
    pub fn new(train_path: &Path, formula: Formula, training: P, validation: P) -> Self {
        Self {
            train_path: train_path.to_path_buf(),
            test_path: None,
            formula,
            filters: Vec::new(),
            training,
            validation,
            seeds: SeedSequence::fixed(),
            delimiter: b',',
        }
    }

    /// Set the file `test` predicts.
    #[must_use]
    pub fn with_test_path(mut self, test_path: &Path) -> Self {
        self.test_path = Some(test_path.to_path_buf());
        self
    }

    /// Set the filters applied, in order, to every loaded file.
    #[must_use]
    pub fn with_filters(mut self, filters: Vec<RowFilter>) -> Self {
        self.filters = filters;
        self
    }

    /// Replace the seed sequence.
    #[must_use]
    pub fn with_seeds(mut self, seeds: SeedSequence) -> Self {
        self.seeds = seeds;
        self
    }

    /// Set the field delimiter of the input files.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Return the formula.
    #[must_use]
    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// Return the seed sequence.
    #[must_use]
    pub fn seeds(&self) -> &SeedSequence {
        &self.seeds
    }
}

/// Drives a [`Learner`] over CSV files.
///
/// Holds at most one trained model, replaced by each successful
/// [`train`](Self::train). Leave-one-out evaluation never touches it.
pub struct Harness<L: Learner> {
    learner: L,
    config: HarnessConfig<L::Params>,
    model: Option<L::Model>,
}

impl<L: Learner> Harness<L> {
    /// Create an untrained harness.
    pub fn new(learner: L, config: HarnessConfig<L::Params>) -> Self {
        Self {
            learner,
            config,
            model: None,
        }
    }

    /// Return `true` once `train` has succeeded.
    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Return the trained model, if any.
    #[must_use]
    pub fn model(&self) -> Option<&L::Model> {
        self.model.as_ref()
    }

    /// Return the config.
    #[must_use]
    pub fn config(&self) -> &HarnessConfig<L::Params> {
        &self.config
    }

    /// Fit a model to the training file and keep it.
    ///
    /// Predictor importances are logged and returned in the summary.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`EvalError::Io`] | The training file cannot be read |
    /// | [`EvalError::Frame`] | A filter names an unknown column |
    /// | [`EvalError::NonIntegralLabel`] | A label is not an integer |
    /// | [`EvalError::SeedsExhausted`] | The fit needs more seeds than available |
    /// | [`EvalError::Rf`] | The learner rejects the data or parameters |
    #[instrument(skip(self), fields(path = %self.config.train_path.display()))]
    pub fn train(&mut self) -> Result<TrainingSummary, EvalError> {
        let frame = self.load(&self.config.train_path)?;
        let formula = &self.config.formula;
        info!(n_rows = frame.n_rows(), %formula, params = ?self.config.training, "training");

        let model = self
            .learner
            .fit(formula, &frame, &self.config.training, &self.config.seeds)?;
        let summary = TrainingSummary::new(
            frame.n_rows(),
            formula.to_string(),
            formula.predictors(),
            &model.importance(),
        );
        for feature in &summary.importance {
            info!(
                rank = feature.rank,
                name = %feature.name,
                importance = feature.importance,
                "predictor importance"
            );
        }
        self.model = Some(model);
        Ok(summary)
    }

    /// Predict every row of the testing file with the trained model.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`EvalError::ModelNotTrained`] | `train` has not succeeded |
    /// | [`EvalError::NoTestPath`] | No testing file is configured |
    /// | [`EvalError::Io`] | The testing file cannot be read |
    /// | [`EvalError::NonIntegralLabel`] | A label is not an integer |
    #[instrument(skip(self))]
    pub fn test(&self) -> Result<EvaluationResult, EvalError> {
        let model = self.model.as_ref().ok_or(EvalError::ModelNotTrained)?;
        let path = self.config.test_path.as_deref().ok_or(EvalError::NoTestPath)?;
        let frame = self.load(path)?;
        let formula = &self.config.formula;
        let actual = integral_labels(formula, &frame)?;
        let rows = predictor_rows(formula, &frame)?;

        let mut predictions = Vec::with_capacity(rows.len());
        for (row, (features, actual)) in rows.iter().zip(actual).enumerate() {
            let predicted = model.predict(features)?;
            info!(row, predicted, actual, "prediction");
            predictions.push(Prediction {
                row,
                predicted,
                actual,
            });
        }

        let result = EvaluationResult::from_predictions(predictions);
        info!(accuracy = result.accuracy(), n_rows = frame.n_rows(), "test complete");
        Ok(result)
    }

    /// Leave-one-out cross-validation over the training file.
    ///
    /// Fold `i` fits a fresh model with the validation parameters to every
    /// row except `i`, then predicts row `i`. Every fold takes its seeds
    /// from the start of the sequence. Folds run in parallel; predictions
    /// come back in row order, so repeated runs give identical results.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`EvalError::Io`] | The training file cannot be read |
    /// | [`EvalError::TooFewRows`] | Fewer than two rows after filtering |
    /// | [`EvalError::NonIntegralLabel`] | A label is not an integer |
    /// | [`EvalError::SeedsExhausted`] | A fold fit needs more seeds than available |
    /// | [`EvalError::Rf`] | The learner rejects a fold |
    #[instrument(skip(self), fields(path = %self.config.train_path.display()))]
    pub fn evaluate_precision(&self) -> Result<EvaluationResult, EvalError> {
        let frame = self.load(&self.config.train_path)?;
        let n_rows = frame.n_rows();
        if n_rows < 2 {
            return Err(EvalError::TooFewRows { n_rows });
        }
        let formula = &self.config.formula;
        let actual = integral_labels(formula, &frame)?;
        let rows = predictor_rows(formula, &frame)?;
        info!(n_rows, params = ?self.config.validation, "leave-one-out evaluation");

        let predictions: Vec<Prediction> = (0..n_rows)
            .into_par_iter()
            .map(|row| -> Result<Prediction, EvalError> {
                let fold = leave_out(&frame, row)?;
                let model =
                    self.learner
                        .fit(formula, &fold, &self.config.validation, &self.config.seeds)?;
                let predicted = model.predict(&rows[row])?;
                debug!(row, predicted, actual = actual[row], "fold done");
                Ok(Prediction {
                    row,
                    predicted,
                    actual: actual[row],
                })
            })
            .collect::<Result<_, _>>()?;

        for p in &predictions {
            info!(row = p.row, predicted = p.predicted, actual = p.actual, "prediction");
        }
        let result = EvaluationResult::from_predictions(predictions);
        debug!(confusion = %result.confusion(), "leave-one-out confusion matrix");
        info!(accuracy = result.accuracy(), n_rows, "leave-one-out evaluation complete");
        Ok(result)
    }

    /// Predict the label of one observation with the trained model.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`EvalError::ModelNotTrained`] | `train` has not succeeded |
    /// | [`EvalError::MissingFeature`] | The observation lacks a predictor |
    #[instrument(skip(self))]
    pub fn predict(&self, observation: &Observation) -> Result<i64, EvalError> {
        let model = self.model.as_ref().ok_or(EvalError::ModelNotTrained)?;
        let features = observation.project(&self.config.formula)?;
        let predicted = model.predict(&features)?;
        info!(predicted, "prediction");
        Ok(predicted)
    }

    fn load(&self, path: &Path) -> Result<Frame, EvalError> {
        let mut frame = FrameReader::new(path)
            .with_delimiter(self.config.delimiter)
            .read(&self.config.formula)?;
        for filter in &self.config.filters {
            let before = frame.n_rows();
            frame = filter.apply(&frame)?;
            debug!(%filter, before, after = frame.n_rows(), "row filter applied");
        }
        Ok(frame)
    }
}

/// Every row of `frame` except `row`, in order.
fn leave_out(frame: &Frame, row: usize) -> Result<Frame, EvalError> {
    let head = frame.slice(0, row)?;
    let tail = frame.slice(row + 1, frame.n_rows())?;
    Ok(stack(&head, &tail)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    /// Predicts the most common training label; ties go to the smaller label.
    struct MajorityLearner;

    struct Majority {
        label: i64,
        n_predictors: usize,
    }

    impl Classifier for Majority {
        fn predict(&self, features: &[f64]) -> Result<i64, EvalError> {
            assert_eq!(features.len(), self.n_predictors);
            Ok(self.label)
        }

        fn importance(&self) -> Vec<f64> {
            vec![0.0; self.n_predictors]
        }
    }

    impl Learner for MajorityLearner {
        type Params = ();
        type Model = Majority;

        fn fit(
            &self,
            formula: &Formula,
            frame: &Frame,
            _params: &(),
            seeds: &SeedSequence,
        ) -> Result<Majority, EvalError> {
            seeds.take(1)?;
            let labels = integral_labels(formula, frame)?;
            let ones = labels.iter().filter(|&&l| l == 1).count();
            let label = i64::from(ones * 2 > labels.len());
            Ok(Majority {
                label,
                n_predictors: formula.predictors().len(),
            })
        }
    }

    fn csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    fn alternating(n: usize) -> NamedTempFile {
        let mut content = String::from("WAP,Minute,EXECUTE\n");
        for i in 0..n {
            content.push_str(&format!("0.{},{},{}\n", 60 + i, (i % 3) * 20, i % 2));
        }
        csv(&content)
    }

    fn formula() -> Formula {
        Formula::new("EXECUTE", ["WAP", "Minute"]).unwrap()
    }

    fn harness(train: &Path) -> Harness<MajorityLearner> {
        Harness::new(MajorityLearner, HarnessConfig::new(train, formula(), (), ()))
    }

    fn observation() -> Observation {
        Observation {
            wap: 0.6,
            volume: 0.0,
            count: 0.0,
            minute: 0.0,
            tesla3: 0.0,
            tesla6: 0.0,
            tesla9: 0.0,
            decision: None,
        }
    }

    #[test]
    fn test_and_predict_need_training() {
        let train = alternating(4);
        let harness = harness(train.path());
        assert!(matches!(harness.test(), Err(EvalError::ModelNotTrained)));
        assert!(matches!(harness.predict(&observation()), Err(EvalError::ModelNotTrained)));
    }

    #[test]
    fn loocv_majority_is_always_wrong_on_balanced_data() {
        // Leaving one row out tips the majority to the other label.
        let train = alternating(10);
        let result = harness(train.path()).evaluate_precision().unwrap();
        assert_eq!(result.predictions().len(), 10);
        assert_eq!(result.accuracy(), 0.0);
        for (i, p) in result.predictions().iter().enumerate() {
            assert_eq!(p.row, i);
            assert_eq!(p.actual, (i % 2) as i64);
            assert_eq!(p.predicted, 1 - p.actual);
        }
    }

    #[test]
    fn loocv_leaves_model_untouched() {
        let train = alternating(6);
        let harness = harness(train.path());
        harness.evaluate_precision().unwrap();
        assert!(!harness.is_trained());
    }

    #[test]
    fn train_then_test_and_predict() {
        let train = csv("WAP,Minute,EXECUTE\n0.6,0,1\n0.7,20,1\n0.8,40,0\n");
        let test = csv("WAP,Minute,EXECUTE\n0.6,0,1\n0.9,20,0\n");
        let mut harness = Harness::new(
            MajorityLearner,
            HarnessConfig::new(train.path(), formula(), (), ()).with_test_path(test.path()),
        );
        let summary = harness.train().unwrap();
        assert_eq!(summary.n_rows, 3);
        assert_eq!(summary.importance.len(), 2);

        let result = harness.test().unwrap();
        assert_eq!(result.predictions().len(), 2);
        assert_eq!(result.accuracy(), 0.5);
        assert_eq!(harness.predict(&observation()).unwrap(), 1);
    }

    #[test]
    fn test_without_test_path() {
        let train = alternating(4);
        let mut harness = harness(train.path());
        harness.train().unwrap();
        assert!(matches!(harness.test(), Err(EvalError::NoTestPath)));
    }

    #[test]
    fn filters_apply_before_fitting() {
        // Minute 0 rows are 0,3,6,9 -> labels 0,1,0,1.
        let train = alternating(10);
        let config = HarnessConfig::new(train.path(), formula(), (), ())
            .with_filters(vec![RowFilter::one_of("Minute", vec![0.0])]);
        let mut harness = Harness::new(MajorityLearner, config);
        assert_eq!(harness.train().unwrap().n_rows, 4);
        assert_eq!(harness.evaluate_precision().unwrap().predictions().len(), 4);
    }

    #[test]
    fn too_few_rows_after_filtering() {
        let train = alternating(10);
        let config = HarnessConfig::new(train.path(), formula(), (), ())
            .with_filters(vec![RowFilter::new("WAP", |v| v < 0.605)]);
        let harness = Harness::new(MajorityLearner, config);
        assert!(matches!(
            harness.evaluate_precision(),
            Err(EvalError::TooFewRows { n_rows: 1 })
        ));
    }

    #[test]
    fn non_integral_label_fails() {
        let train = csv("WAP,Minute,EXECUTE\n0.6,0,1\n0.7,20,0.5\n");
        let harness = harness(train.path());
        assert!(matches!(
            harness.evaluate_precision(),
            Err(EvalError::NonIntegralLabel { row: 1, .. })
        ));
    }

    #[test]
    fn leave_out_drops_one_row() {
        let frame = Frame::new(
            vec!["a".into()],
            vec![vec![0.0], vec![1.0], vec![2.0]],
        )
        .unwrap();
        assert_eq!(leave_out(&frame, 0).unwrap().column(0).unwrap(), vec![1.0, 2.0]);
        assert_eq!(leave_out(&frame, 1).unwrap().column(0).unwrap(), vec![0.0, 2.0]);
        assert_eq!(leave_out(&frame, 2).unwrap().column(0).unwrap(), vec![0.0, 1.0]);
    }
}
