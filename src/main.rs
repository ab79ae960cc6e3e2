use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use execflag_eval::{
    ClassMetrics, FeatureImportance, ForestLearner, ForestParams, Harness, HarnessConfig,
    Observation, RowFilter,
};
use execflag_frame::{Formula, Frame, merge_normalized, normalize, split};
use execflag_io::{FrameReader, FrameWriter};
use execflag_rf::SplitCriterion;

#[derive(Parser)]
#[command(name = "execflag")]
#[command(about = "Trade execution flag classification over minute-bar CSV files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Label and predictor columns.
#[derive(Args, Debug, Clone)]
struct FormulaArgs {
    /// Label column
    #[arg(long, default_value = "EXECUTE")]
    label: String,

    /// Comma-separated predictor columns (defaults to the trading formula)
    #[arg(long, value_delimiter = ',')]
    predictors: Vec<String>,
}

impl FormulaArgs {
    fn formula(&self) -> Result<Formula> {
        let predictors = if self.predictors.is_empty() {
            Formula::execute_flag().predictors().to_vec()
        } else {
            self.predictors.clone()
        };
        Formula::new(self.label.clone(), predictors).context("invalid formula")
    }
}

/// Overrides applied on top of a forest preset.
#[derive(Args, Debug, Clone)]
struct ForestArgs {
    /// Number of trees
    #[arg(long)]
    trees: Option<usize>,

    /// Predictors sampled per split (defaults to floor(sqrt(p)) or the preset)
    #[arg(long)]
    mtry: Option<usize>,

    /// Maximum tree depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Maximum leaves per tree
    #[arg(long)]
    max_leaf_nodes: Option<usize>,

    /// Minimum samples per leaf
    #[arg(long)]
    min_samples_leaf: Option<usize>,

    /// Bootstrap sample size as a fraction of the rows
    #[arg(long)]
    subsample: Option<f64>,

    /// Comma-separated weights, indexed by ascending label (e.g. "1,100")
    #[arg(long, value_delimiter = ',')]
    class_weights: Vec<f64>,

    /// Comma-separated label values the class weights refer to (e.g. "0,1")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    labels: Vec<i64>,

    /// Split criterion: "gini" or "entropy"
    #[arg(long)]
    criterion: Option<String>,
}

impl ForestArgs {
    fn apply(&self, mut params: ForestParams) -> Result<ForestParams> {
        if let Some(n) = self.trees {
            params = params.with_n_trees(n);
        }
        if let Some(m) = self.mtry {
            params = params.with_mtry(Some(m));
        }
        if let Some(d) = self.max_depth {
            params = params.with_max_depth(Some(d));
        }
        if let Some(l) = self.max_leaf_nodes {
            params = params.with_max_leaf_nodes(Some(l));
        }
        if let Some(l) = self.min_samples_leaf {
            params = params.with_min_samples_leaf(l);
        }
        if let Some(s) = self.subsample {
            params = params.with_subsample(s);
        }
        if !self.class_weights.is_empty() {
            params = params.with_class_weights(Some(self.class_weights.clone()));
        }
        if !self.labels.is_empty() {
            params = params.with_labels(Some(self.labels.clone()));
        }
        if let Some(c) = &self.criterion {
            params = params.with_criterion(parse_criterion(c)?);
        }
        Ok(params)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Leave-one-out evaluation with the validation forest
    Evaluate {
        /// Path to the training CSV file
        #[arg(long)]
        train: PathBuf,

        /// Keep rows whose column is one of the values, e.g. Minute=0,20,40
        #[arg(long)]
        keep: Vec<String>,

        #[command(flatten)]
        formula: FormulaArgs,

        #[command(flatten)]
        forest: ForestArgs,
    },

    /// Train on one file and report accuracy on another
    TrainTest {
        /// Path to the training CSV file
        #[arg(long)]
        train: PathBuf,

        /// Path to the testing CSV file
        #[arg(long)]
        test: PathBuf,

        /// Keep rows whose column is one of the values, e.g. Minute=0,20,40
        #[arg(long)]
        keep: Vec<String>,

        #[command(flatten)]
        formula: FormulaArgs,

        #[command(flatten)]
        forest: ForestArgs,
    },

    /// Train on a file, then classify one observation
    Predict {
        /// Path to the training CSV file
        #[arg(long)]
        train: PathBuf,

        /// Keep rows whose column is one of the values, e.g. Minute=0,20,40
        #[arg(long)]
        keep: Vec<String>,

        #[arg(long, allow_hyphen_values = true)]
        wap: f64,
        #[arg(long, allow_hyphen_values = true)]
        volume: f64,
        #[arg(long, allow_hyphen_values = true)]
        count: f64,
        #[arg(long, allow_hyphen_values = true)]
        minute: f64,
        #[arg(long, allow_hyphen_values = true)]
        tesla3: f64,
        #[arg(long, allow_hyphen_values = true)]
        tesla6: f64,
        #[arg(long, allow_hyphen_values = true)]
        tesla9: f64,
        /// Buy (1), hold (0) or sell (-1)
        #[arg(long, allow_hyphen_values = true)]
        decision: Option<f64>,

        #[command(flatten)]
        formula: FormulaArgs,

        #[command(flatten)]
        forest: ForestArgs,
    },

    /// Filter, normalize, merge and split CSV files
    Prepare {
        /// Input CSV files; more than one is merged side by side
        #[arg(long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output directory for the written files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Base name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long, default_value = "prepared")]
        name: String,

        /// Keep rows whose column is one of the values, e.g. Minute=0,20,40
        #[arg(long)]
        keep: Vec<String>,

        /// Min-max normalize every column (implied when merging)
        #[arg(long, default_value_t = false)]
        normalize: bool,

        /// Fraction of rows written to the training part
        #[arg(long)]
        split_ratio: Option<f64>,
    },
}

#[derive(Serialize)]
struct EvaluateOutput<'a> {
    formula: String,
    n_rows: usize,
    accuracy: f64,
    classes: &'a [i64],
    confusion_matrix: &'a [Vec<usize>],
    class_metrics: &'a [ClassMetrics],
}

#[derive(Serialize)]
struct TrainTestOutput<'a> {
    formula: String,
    n_train_rows: usize,
    n_test_rows: usize,
    accuracy: f64,
    classes: &'a [i64],
    confusion_matrix: &'a [Vec<usize>],
    class_metrics: &'a [ClassMetrics],
    importance: &'a [FeatureImportance],
}

#[derive(Serialize)]
struct PredictOutput {
    formula: String,
    n_train_rows: usize,
    observation: Observation,
    prediction: i64,
}

#[derive(Serialize)]
struct PreparedFile {
    path: PathBuf,
    n_rows: usize,
    n_cols: usize,
}

#[derive(Serialize)]
struct PrepareOutput {
    n_inputs: usize,
    files: Vec<PreparedFile>,
}

fn parse_criterion(s: &str) -> Result<SplitCriterion> {
    match s {
        "gini" => Ok(SplitCriterion::Gini),
        "entropy" => Ok(SplitCriterion::Entropy),
        other => anyhow::bail!("unknown criterion: {other} (expected gini or entropy)"),
    }
}

fn parse_filters(keep: &[String]) -> Result<Vec<RowFilter>> {
    keep.iter()
        .map(|k| {
            k.parse::<RowFilter>()
                .with_context(|| format!("invalid --keep value: {k}"))
        })
        .collect()
}

fn forest_harness(
    train: &Path,
    test: Option<&Path>,
    formula: Formula,
    keep: &[String],
    forest: &ForestArgs,
) -> Result<Harness<ForestLearner>> {
    let mut config = HarnessConfig::new(
        train,
        formula,
        forest.apply(ForestParams::training())?,
        forest.apply(ForestParams::validation())?,
    )
    .with_filters(parse_filters(keep)?);
    if let Some(test) = test {
        config = config.with_test_path(test);
    }
    Ok(Harness::new(ForestLearner, config))
}

fn read_filtered(path: &Path, filters: &[RowFilter]) -> Result<Frame> {
    let mut frame = FrameReader::new(path)
        .read_raw()
        .with_context(|| format!("failed to read {}", path.display()))?;
    for f in filters {
        frame = f
            .apply(&frame)
            .with_context(|| format!("failed to apply filter {f} to {}", path.display()))?;
    }
    Ok(frame)
}

fn prepared(path: PathBuf, frame: &Frame) -> PreparedFile {
    PreparedFile {
        path,
        n_rows: frame.n_rows(),
        n_cols: frame.n_cols(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Evaluate {
            train,
            keep,
            formula,
            forest,
        } => {
            let formula = formula.formula()?;
            let harness = forest_harness(&train, None, formula.clone(), &keep, &forest)?;

            let result = harness
                .evaluate_precision()
                .context("leave-one-out evaluation failed")?;
            info!(accuracy = result.accuracy(), "leave-one-out complete");

            let output = EvaluateOutput {
                formula: formula.to_string(),
                n_rows: result.predictions().len(),
                accuracy: result.accuracy(),
                classes: result.confusion().classes(),
                confusion_matrix: result.confusion().as_rows(),
                class_metrics: result.class_metrics(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::TrainTest {
            train,
            test,
            keep,
            formula,
            forest,
        } => {
            let formula = formula.formula()?;
            let mut harness =
                forest_harness(&train, Some(&test), formula.clone(), &keep, &forest)?;

            let summary = harness.train().context("training failed")?;
            let result = harness.test().context("testing failed")?;
            info!(accuracy = result.accuracy(), "test complete");

            let output = TrainTestOutput {
                formula: formula.to_string(),
                n_train_rows: summary.n_rows,
                n_test_rows: result.predictions().len(),
                accuracy: result.accuracy(),
                classes: result.confusion().classes(),
                confusion_matrix: result.confusion().as_rows(),
                class_metrics: result.class_metrics(),
                importance: &summary.importance,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            train,
            keep,
            wap,
            volume,
            count,
            minute,
            tesla3,
            tesla6,
            tesla9,
            decision,
            formula,
            forest,
        } => {
            let formula = formula.formula()?;
            let mut harness = forest_harness(&train, None, formula.clone(), &keep, &forest)?;
            let summary = harness.train().context("training failed")?;

            let observation = Observation {
                wap,
                volume,
                count,
                minute,
                tesla3,
                tesla6,
                tesla9,
                decision,
            };
            let prediction = harness
                .predict(&observation)
                .context("prediction failed")?;
            info!(prediction, "observation classified");

            let output = PredictOutput {
                formula: formula.to_string(),
                n_train_rows: summary.n_rows,
                observation,
                prediction,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Prepare {
            input,
            output_dir,
            name,
            keep,
            normalize: normalize_all,
            split_ratio,
        } => {
            let filters = parse_filters(&keep)?;
            let frames = input
                .iter()
                .map(|path| read_filtered(path, &filters))
                .collect::<Result<Vec<_>>>()?;

            // 1. Merge or normalize
            let frame = match frames.as_slice() {
                [single] if normalize_all => normalize(single).context("normalization failed")?,
                [single] => single.clone(),
                many => merge_normalized(many).context("merge failed")?,
            };
            info!(
                n_rows = frame.n_rows(),
                n_cols = frame.n_cols(),
                "frame prepared"
            );

            // 2. Split and write
            let writer = FrameWriter::new(&output_dir)?;
            let files = match split_ratio {
                Some(ratio) => {
                    let (train, test) = split(&frame, ratio).context("split failed")?;
                    vec![
                        prepared(writer.write(&format!("{name}_train"), &train)?, &train),
                        prepared(writer.write(&format!("{name}_test"), &test)?, &test),
                    ]
                }
                None => vec![prepared(writer.write(&name, &frame)?, &frame)],
            };

            let output = PrepareOutput {
                n_inputs: input.len(),
                files,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
