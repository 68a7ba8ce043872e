//! CSV pattern reader with full input validation.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use arbor_cart::{PatternId, PatternSet};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{LabeledPatterns, QueryPatterns};

/// Reads patterns from a CSV file.
///
/// Expected CSV formats (header row required):
/// - labeled: `pattern_id,label,f0,f1,...,fn`
/// - unlabeled: `pattern_id,f0,f1,...,fn`
///
/// Pattern ids are non-negative integers, unique within the file. Every row
/// must have the same number of columns as the header, and every feature
/// value must be a finite float.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::NoFeatureColumns`] | Header has no feature columns |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::InvalidPatternId`] | Id column is not a non-negative integer |
/// | [`IoError::EmptyLabel`] | Label column is blank (labeled files only) |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
/// | [`IoError::DuplicatePatternId`] | Same pattern id appears twice |
pub struct PatternReader {
    path: PathBuf,
}

/// Rows parsed from one file before they are assembled into a domain type.
struct ParsedRows {
    feature_names: Vec<String>,
    vectors: BTreeMap<PatternId, Vec<f64>>,
    labels: BTreeMap<PatternId, String>,
}

impl PatternReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read a labeled file into a validated [`PatternSet`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read_labeled(&self) -> Result<LabeledPatterns, IoError> {
        let rows = self.parse(true)?;
        let patterns =
            PatternSet::new(rows.vectors, rows.labels).map_err(|e| IoError::InvalidPatterns {
                path: self.path.clone(),
                source: e,
            })?;

        info!(
            n_patterns = patterns.len(),
            n_features = patterns.n_features(),
            n_classes = patterns.n_classes(),
            "labeled patterns loaded"
        );

        Ok(LabeledPatterns::new(rows.feature_names, patterns))
    }

    /// Read an unlabeled file into query vectors.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read_unlabeled(&self) -> Result<QueryPatterns, IoError> {
        let rows = self.parse(false)?;

        info!(
            n_patterns = rows.vectors.len(),
            n_features = rows.feature_names.len(),
            "query patterns loaded"
        );

        Ok(QueryPatterns {
            feature_names: rows.feature_names,
            vectors: rows.vectors,
        })
    }

    fn parse(&self, labeled: bool) -> Result<ParsedRows, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets the row-length check below report the row.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?;
        let expected_cols = header.len();
        let first_feature = if labeled { 2 } else { 1 };
        if expected_cols <= first_feature {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
                columns: expected_cols,
            });
        }
        let feature_names: Vec<String> =
            header.iter().skip(first_feature).map(str::to_string).collect();
        debug!(expected_cols, labeled, "read CSV header");

        let mut vectors = BTreeMap::new();
        let mut labels = BTreeMap::new();
        let mut seen: HashMap<u64, usize> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let raw_id = record.get(0).unwrap_or("");
            let pattern_id: u64 = raw_id.parse().map_err(|_| IoError::InvalidPatternId {
                path: self.path.clone(),
                row_index,
                raw: raw_id.to_string(),
            })?;

            if let Some(&first_row) = seen.get(&pattern_id) {
                return Err(IoError::DuplicatePatternId {
                    path: self.path.clone(),
                    pattern_id,
                    first_row,
                    second_row: row_index,
                });
            }
            seen.insert(pattern_id, row_index);

            let mut values = Vec::with_capacity(expected_cols - first_feature);
            for col_index in first_feature..record.len() {
                let raw = record.get(col_index).unwrap_or("");
                let feature_index = col_index - first_feature;
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        feature_index,
                        raw: raw.to_string(),
                    })?;
                values.push(value);
            }

            let id = PatternId::new(pattern_id);
            if labeled {
                let label = record.get(1).unwrap_or("");
                if label.is_empty() {
                    return Err(IoError::EmptyLabel {
                        path: self.path.clone(),
                        row_index,
                    });
                }
                labels.insert(id, label.to_string());
            }
            vectors.insert(id, values);
        }

        if vectors.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        Ok(ParsedRows {
            feature_names,
            vectors,
            labels,
        })
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
