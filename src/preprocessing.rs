//! Fitted column transform: median imputation and standard scaling for
//! numeric columns, `"None"` imputation and one-hot encoding for categorical
//! columns, and an untouched passthrough block for everything else.
//!
//! The fitted state is frozen after [`FittedPreprocessor::fit`]; the serving
//! path only ever calls [`FittedPreprocessor::transform`].

use crate::errors::PipelineError;
use crate::features::{FeatureRecord, FeatureValue};
use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Fill value for missing categorical entries.
pub const MISSING_CATEGORY: &str = "None";

/// Training-time statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub median: f64,
    pub mean: f64,
    pub scale: f64,
}

/// Category vocabulary for one categorical column, sorted and unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub categories: Vec<String>,
}

/// Fixed-length numeric input for the model.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The preprocessing artifact.
///
/// Output layout is the numeric block, then the one-hot block, then the
/// passthrough block, each in the order stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    pub numeric: Vec<NumericColumn>,
    pub categorical: Vec<CategoricalColumn>,
    #[serde(default)]
    pub passthrough: Vec<String>,
}

/// Splits the columns of a training frame into numeric and categorical.
///
/// Kinds come from the schema, not from the values: a column named in
/// `categorical` is categorical even when every row leaves it missing, and
/// every other column is numeric. Both lists are sorted by name.
pub fn column_kinds(frame: &[FeatureRecord], categorical: &[&str]) -> (Vec<String>, Vec<String>) {
    let all: BTreeSet<&str> = frame.iter().flat_map(|r| r.column_names()).collect();
    let (textual, numeric): (Vec<&str>, Vec<&str>) =
        all.into_iter().partition(|name| categorical.contains(name));

    (
        numeric.into_iter().map(str::to_string).collect(),
        textual.into_iter().map(str::to_string).collect(),
    )
}

impl FittedPreprocessor {
    /// Learns medians, scaling statistics and category vocabularies.
    ///
    /// Columns present in the frame but listed in neither `numeric_columns`
    /// nor `categorical_columns` become passthrough columns, ordered by name.
    pub fn fit(
        frame: &[FeatureRecord],
        numeric_columns: &[String],
        categorical_columns: &[String],
    ) -> anyhow::Result<Self> {
        if frame.is_empty() {
            bail!("cannot fit a preprocessor on an empty frame");
        }

        let numeric = numeric_columns
            .iter()
            .map(|name| fit_numeric(frame, name))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let categorical = categorical_columns
            .iter()
            .map(|name| fit_categorical(frame, name))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let assigned: HashSet<&str> = numeric_columns
            .iter()
            .chain(categorical_columns)
            .map(String::as_str)
            .collect();
        let passthrough: BTreeSet<String> = frame
            .iter()
            .flat_map(|record| record.column_names())
            .filter(|name| !assigned.contains(name))
            .map(str::to_string)
            .collect();

        let fitted = Self {
            numeric,
            categorical,
            passthrough: passthrough.into_iter().collect(),
        };
        fitted.validate().map_err(|reason| anyhow!(reason))?;
        Ok(fitted)
    }

    /// Length of every vector this preprocessor produces.
    pub fn width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|column| column.categories.len())
                .sum::<usize>()
            + self.passthrough.len()
    }

    /// Output column names in vector order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.width());
        names.extend(self.numeric.iter().map(|c| format!("num__{}", c.name)));
        for column in &self.categorical {
            names.extend(
                column
                    .categories
                    .iter()
                    .map(|level| format!("cat__{}_{}", column.name, level)),
            );
        }
        names.extend(self.passthrough.iter().map(|c| format!("remainder__{}", c)));
        names
    }

    /// Structural checks run after fitting and after loading from disk.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        let names = self
            .numeric
            .iter()
            .map(|c| &c.name)
            .chain(self.categorical.iter().map(|c| &c.name))
            .chain(self.passthrough.iter());
        for name in names {
            if !seen.insert(name.as_str()) {
                return Err(format!("column `{}` is assigned more than once", name));
            }
        }

        for column in &self.numeric {
            if !column.median.is_finite() || !column.mean.is_finite() {
                return Err(format!("column `{}` has non-finite statistics", column.name));
            }
            if !column.scale.is_finite() || column.scale <= 0.0 {
                return Err(format!("column `{}` has invalid scale {}", column.name, column.scale));
            }
        }

        for column in &self.categorical {
            if column.categories.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(format!(
                    "categories of `{}` are not sorted and unique",
                    column.name
                ));
            }
        }

        Ok(())
    }

    /// Maps one engineered record to its feature vector.
    ///
    /// Never refits. Unseen categorical levels encode as all zeros. A column
    /// the fitted state expects but the record lacks entirely is a schema
    /// mismatch, unlike an explicit missing value which is imputed.
    pub fn transform(&self, record: &FeatureRecord) -> Result<FeatureVector, PipelineError> {
        let mut out = Vec::with_capacity(self.width());

        for column in &self.numeric {
            let raw = match expect_column(record, &column.name)? {
                FeatureValue::Number(value) if !value.is_nan() => *value,
                FeatureValue::Number(_) | FeatureValue::Missing => column.median,
                FeatureValue::Text(text) => {
                    return Err(PipelineError::failed(format!(
                        "numeric column `{}` received text value `{}`",
                        column.name, text
                    )))
                }
            };
            out.push((raw - column.mean) / column.scale);
        }

        for column in &self.categorical {
            let level = category_of(expect_column(record, &column.name)?);
            let hit = column
                .categories
                .binary_search_by(|candidate| candidate.as_str().cmp(level.as_str()))
                .ok();
            out.extend((0..column.categories.len()).map(|i| {
                if Some(i) == hit {
                    1.0
                } else {
                    0.0
                }
            }));
        }

        for name in &self.passthrough {
            let value = match expect_column(record, name)? {
                FeatureValue::Number(value) => *value,
                FeatureValue::Missing => f64::NAN,
                FeatureValue::Text(text) => {
                    return Err(PipelineError::failed(format!(
                        "passthrough column `{}` received text value `{}`",
                        name, text
                    )))
                }
            };
            out.push(value);
        }

        Ok(FeatureVector(out))
    }

    pub fn transform_batch(
        &self,
        records: &[FeatureRecord],
    ) -> Result<Vec<FeatureVector>, PipelineError> {
        records.iter().map(|record| self.transform(record)).collect()
    }
}

fn expect_column<'a>(
    record: &'a FeatureRecord,
    name: &str,
) -> Result<&'a FeatureValue, PipelineError> {
    record.get(name).ok_or_else(|| {
        PipelineError::failed(format!("column `{}` is absent from the record", name))
    })
}

fn category_of(value: &FeatureValue) -> String {
    match value {
        FeatureValue::Text(text) => text.clone(),
        FeatureValue::Number(number) => number.to_string(),
        FeatureValue::Missing => MISSING_CATEGORY.to_string(),
    }
}

fn fit_numeric(frame: &[FeatureRecord], name: &str) -> anyhow::Result<NumericColumn> {
    let mut observed = Vec::with_capacity(frame.len());
    let mut missing = 0usize;
    for record in frame {
        match record.get(name) {
            Some(FeatureValue::Number(value)) if !value.is_nan() => observed.push(*value),
            Some(FeatureValue::Number(_)) | Some(FeatureValue::Missing) | None => missing += 1,
            Some(FeatureValue::Text(text)) => {
                bail!("numeric column `{}` contains text value `{}`", name, text)
            }
        }
    }

    if observed.is_empty() {
        bail!("numeric column `{}` has no observed values", name);
    }

    let median = median(&mut observed.clone());

    // Scaling statistics are computed after imputation.
    let n = (observed.len() + missing) as f64;
    let sum = observed.iter().sum::<f64>() + median * missing as f64;
    let mean = sum / n;
    let variance = (observed.iter().map(|x| (x - mean).powi(2)).sum::<f64>()
        + (median - mean).powi(2) * missing as f64)
        / n;
    let std = variance.sqrt();
    let scale = if std == 0.0 { 1.0 } else { std };

    Ok(NumericColumn {
        name: name.to_string(),
        median,
        mean,
        scale,
    })
}

fn fit_categorical(frame: &[FeatureRecord], name: &str) -> anyhow::Result<CategoricalColumn> {
    let categories: BTreeSet<String> = frame
        .iter()
        .map(|record| {
            record
                .get(name)
                .map_or_else(|| MISSING_CATEGORY.to_string(), category_of)
        })
        .collect();

    Ok(CategoricalColumn {
        name: name.to_string(),
        categories: categories.into_iter().collect(),
    })
}

/// Median of a non-empty slice; the mean of the two middle values for even lengths.
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
