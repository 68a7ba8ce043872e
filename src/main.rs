use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use arbor_cart::{CartConfig, CartTree, ConfusionMatrix, ImpurityMeasure, Pruner};
use arbor_io::{ExperimentName, PatternReader, ResultWriter};

#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Classification trees with cost-complexity pruning")]
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

    /// Number of threads for parallel classification (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Grow a tree on labeled data, prune it against a validation set, and save it
    Train {
        /// Path to the labeled training CSV (pattern_id,label,f0,...)
        #[arg(long)]
        train: PathBuf,

        /// Path to the labeled validation CSV used for pruning
        #[arg(long)]
        validation: PathBuf,

        /// Complexity parameter for pruning (0 keeps every split that helps validation)
        #[arg(long, default_value_t = 0.0)]
        alpha: f64,

        /// Impurity measure: "misclassification", "entropy", or "gini"
        #[arg(long, default_value = "gini")]
        measure: String,

        /// A node is split only if it holds more patterns than this
        #[arg(long, default_value_t = 5)]
        min_node_size: usize,

        /// A node is split only if its impurity exceeds this
        #[arg(long, default_value_t = 0.001)]
        tolerance: f64,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Score a saved tree on labeled data
    Evaluate {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Path to the labeled CSV to score
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Classify unlabeled patterns with a saved tree
    Predict {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Path to the unlabeled CSV (pattern_id,f0,...)
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    experiment: String,
    measure: String,
    n_train: usize,
    n_validation: usize,
    n_features: usize,
    alpha: f64,
    terminals_grown: usize,
    terminals_pruned: usize,
    depth: usize,
    validation_error_grown: f64,
    validation_error_pruned: f64,
    model_path: PathBuf,
}

#[derive(Serialize)]
struct EvaluateOutput {
    experiment: String,
    n_patterns: usize,
    misclassification_rate: f64,
    n_ambiguous: usize,
    model_n_terminals: usize,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    n_patterns: usize,
    n_ambiguous: usize,
    model_n_terminals: usize,
    model_n_features: usize,
}

fn load_model(path: &Path) -> Result<CartTree> {
    let tree = CartTree::load(path).context("failed to load model")?;
    info!(
        n_nodes = tree.n_nodes(),
        n_terminals = tree.n_terminals(),
        n_features = tree.n_features(),
        "model loaded"
    );
    Ok(tree)
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
        if threads == 0 {
            anyhow::bail!("--threads must be at least 1");
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train {
            train,
            validation,
            alpha,
            measure,
            min_node_size,
            tolerance,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let measure: ImpurityMeasure = measure.parse()?;
            let pruner = Pruner::new(alpha)?;

            // 1. Read training and validation data
            let training = PatternReader::new(&train)
                .read_labeled()
                .context("failed to read training CSV")?;
            let validation = PatternReader::new(&validation)
                .read_labeled()
                .context("failed to read validation CSV")?;

            // 2. Grow
            let tree = CartConfig::new()
                .with_measure(measure)
                .with_min_node_size(min_node_size)
                .with_tolerance(tolerance)
                .grow(training.patterns())
                .context("tree growth failed")?;
            info!(
                n_nodes = tree.n_nodes(),
                n_terminals = tree.n_terminals(),
                depth = tree.depth(),
                "tree grown"
            );

            // 3. Prune
            let (pruned, report) = pruner
                .prune_with_report(&tree, validation.patterns())
                .context("pruning failed")?;

            // 4. Save model and tree summary
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let model_path = writer.model_path();
            pruned.save(&model_path).context("failed to save model")?;
            writer.write_tree(&pruned, training.feature_names(), Some(&report))?;

            // 5. Print summary
            let output = TrainOutput {
                experiment,
                measure: measure.name().to_string(),
                n_train: training.patterns().len(),
                n_validation: validation.patterns().len(),
                n_features: training.patterns().n_features(),
                alpha,
                terminals_grown: report.terminals_before,
                terminals_pruned: report.terminals_after,
                depth: pruned.depth(),
                validation_error_grown: report.error_before,
                validation_error_pruned: report.error_after,
                model_path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Evaluate {
            model,
            data,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let tree = load_model(&model)?;

            let dataset = PatternReader::new(&data)
                .read_labeled()
                .context("failed to read evaluation CSV")?;

            let rate = tree
                .misclassification_rate(dataset.patterns())
                .context("evaluation failed")?;
            let confusion = ConfusionMatrix::from_tree(&tree, dataset.patterns())
                .context("evaluation failed")?;
            info!(misclassification_rate = rate, "evaluation complete");

            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_evaluation(rate, &confusion)?;

            let output = EvaluateOutput {
                experiment,
                n_patterns: dataset.patterns().len(),
                misclassification_rate: rate,
                n_ambiguous: confusion.ambiguous().iter().sum(),
                model_n_terminals: tree.n_terminals(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            model,
            data,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let tree = load_model(&model)?;

            let queries = PatternReader::new(&data)
                .read_unlabeled()
                .context("failed to read query CSV")?;

            let predictions = tree
                .classify_batch(&queries.vectors)
                .context("prediction failed")?;

            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_predictions(&predictions)?;

            let output = PredictOutput {
                experiment,
                n_patterns: queries.len(),
                n_ambiguous: predictions
                    .values()
                    .filter(|c| c.label.is_ambiguous())
                    .count(),
                model_n_terminals: tree.n_terminals(),
                model_n_features: tree.n_features(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
