//! JSON result writer for training, evaluation, and prediction outputs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use arbor_cart::{CartTree, Classification, ClassMetrics, ConfusionMatrix, PatternId, PruneReport};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Writes tree summaries, evaluations, and predictions to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_tree.json`,
/// `{experiment}_evaluate.json`, and `{experiment}_predict.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write a tree summary to `{experiment}_tree.json`.
    ///
    /// Lists every node with its parent, children, and either its decision
    /// or its terminal label, posterior, impurity, and member count.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`] on failure.
    #[instrument(skip_all)]
    pub fn write_tree(
        &self,
        tree: &CartTree,
        feature_names: &[String],
        prune_report: Option<&PruneReport>,
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("tree");

        let nodes: Vec<NodeEntry<'_>> = tree
            .node_ids()
            .into_iter()
            .map(|id| {
                let decision = tree.decision(id).map(|d| DecisionEntry {
                    feature: d.feature.index(),
                    feature_name: feature_names.get(d.feature.index()).map(String::as_str),
                    threshold: d.threshold,
                });
                NodeEntry {
                    id: id.get(),
                    parent: tree.parent(id).map(|p| p.get()),
                    children: tree.children(id).map(|(l, r)| [l.get(), r.get()]),
                    n_members: tree.members(id).map_or(0, |m| m.len()),
                    decision,
                    label: tree.prediction(id).and_then(|p| p.class()),
                    impurity: tree.terminal_impurity(id).map(|i| i.value()),
                    posterior: tree.terminal_posterior(id).map(|p| p.as_map()),
                }
            })
            .collect();

        let artifact = TreeArtifact {
            experiment: self.experiment.as_str(),
            measure: tree.measure().name(),
            n_features: tree.n_features(),
            n_nodes: tree.n_nodes(),
            n_terminals: tree.n_terminals(),
            depth: tree.depth(),
            label_counts: tree.label_counts(),
            prune: prune_report,
            nodes,
        };

        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "tree summary written");
        Ok(path)
    }

    /// Write evaluation results to `{experiment}_evaluate.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`] on failure.
    #[instrument(skip_all)]
    pub fn write_evaluation(
        &self,
        misclassification_rate: f64,
        confusion: &ConfusionMatrix,
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("evaluate");

        let artifact = EvaluateArtifact {
            experiment: self.experiment.as_str(),
            n_patterns: confusion.total(),
            misclassification_rate,
            accuracy: confusion.accuracy(),
            classes: confusion.classes(),
            confusion_matrix: confusion.as_rows(),
            ambiguous: confusion.ambiguous(),
            class_metrics: confusion.class_metrics(),
        };

        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "evaluation result written");
        Ok(path)
    }

    /// Write predictions to `{experiment}_predict.json`.
    ///
    /// Ambiguous predictions are written with a `null` label.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`] on failure.
    #[instrument(skip_all)]
    pub fn write_predictions(
        &self,
        predictions: &BTreeMap<PatternId, Classification>,
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("predict");

        let entries: Vec<PredictionEntry<'_>> = predictions
            .iter()
            .map(|(id, c)| PredictionEntry {
                pattern_id: id.get(),
                label: c.label.class(),
                ambiguous: c.label.is_ambiguous(),
                posterior: c.posterior.as_map(),
            })
            .collect();

        let artifact = PredictArtifact {
            experiment: self.experiment.as_str(),
            n_patterns: predictions.len(),
            predictions: entries,
        };

        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "predictions written");
        Ok(path)
    }

    /// Return the path where the model binary should be saved.
    ///
    /// Does not write anything, just computes `{output_dir}/{experiment}_model.bin`.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_model.bin", self.experiment.as_str()))
    }

    fn artifact_path(&self, kind: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{kind}.json", self.experiment.as_str()))
    }

    fn write_json(&self, path: &Path, artifact: &impl Serialize) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Serialize {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, &json).map_err(|e| IoError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct TreeArtifact<'a> {
    experiment: &'a str,
    measure: &'static str,
    n_features: usize,
    n_nodes: usize,
    n_terminals: usize,
    depth: usize,
    label_counts: &'a BTreeMap<String, usize>,
    prune: Option<&'a PruneReport>,
    nodes: Vec<NodeEntry<'a>>,
}

#[derive(Serialize)]
struct NodeEntry<'a> {
    id: usize,
    parent: Option<usize>,
    children: Option<[usize; 2]>,
    n_members: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    decision: Option<DecisionEntry<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    impurity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    posterior: Option<&'a BTreeMap<String, f64>>,
}

#[derive(Serialize)]
struct DecisionEntry<'a> {
    feature: usize,
    feature_name: Option<&'a str>,
    threshold: f64,
}

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    experiment: &'a str,
    n_patterns: usize,
    misclassification_rate: f64,
    accuracy: f64,
    classes: &'a [String],
    confusion_matrix: &'a [Vec<usize>],
    ambiguous: &'a [usize],
    class_metrics: Vec<ClassMetrics>,
}

#[derive(Serialize)]
struct PredictArtifact<'a> {
    experiment: &'a str,
    n_patterns: usize,
    predictions: Vec<PredictionEntry<'a>>,
}

#[derive(Serialize)]
struct PredictionEntry<'a> {
    pattern_id: u64,
    label: Option<&'a str>,
    ambiguous: bool,
    posterior: &'a BTreeMap<String, f64>,
}
