//! Feature derivation shared by training and serving.
//!
//! The formulas here must stay byte-for-byte identical to the ones used when
//! the preprocessor was fitted, otherwise the fitted column layout no longer
//! matches what the model was trained on.

use crate::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const BSMT_FIN_SF1: &str = "BsmtFinSF1";
pub const BSMT_FIN_SF2: &str = "BsmtFinSF2";
pub const BSMT_UNF_SF: &str = "BsmtUnfSF";
pub const TOTAL_BSMT_SF: &str = "TotalBsmtSF";
pub const FIRST_FLR_SF: &str = "1stFlrSF";
pub const SECOND_FLR_SF: &str = "2ndFlrSF";
pub const YR_SOLD: &str = "YrSold";
pub const YEAR_BUILT: &str = "YearBuilt";
pub const YEAR_REMOD_ADD: &str = "YearRemodAdd";

pub const TOTAL_SF: &str = "TotalSF";
pub const HOUSE_AGE: &str = "HouseAge";
pub const WAS_REMODELED: &str = "WasRemodeled";

/// Columns added by [`derive`].
pub const DERIVED_COLUMNS: [&str; 3] = [TOTAL_SF, HOUSE_AGE, WAS_REMODELED];

/// Columns read and then dropped by [`derive`].
pub const CONSUMED_COLUMNS: [&str; 6] = [
    YR_SOLD,
    YEAR_BUILT,
    YEAR_REMOD_ADD,
    TOTAL_BSMT_SF,
    FIRST_FLR_SF,
    SECOND_FLR_SF,
];

/// A single cell of a feature record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        FeatureValue::Number(value as f64)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        FeatureValue::Text(value)
    }
}

impl<T: Into<FeatureValue>> From<Option<T>> for FeatureValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FeatureValue::Missing, Into::into)
    }
}

/// Named columns for one record, kept in column-name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRecord {
    columns: BTreeMap<String, FeatureValue>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<FeatureValue>) {
        self.columns.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&FeatureValue> {
        self.columns.get(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<FeatureValue> {
        self.columns.remove(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in sorted order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Reads a column that a formula needs as a number.
    ///
    /// Absent, missing, non-numeric and NaN values are all `InputIncomplete`.
    pub fn require_number(&self, column: &str) -> Result<f64, PipelineError> {
        self.columns
            .get(column)
            .and_then(FeatureValue::as_number)
            .filter(|value| !value.is_nan())
            .ok_or_else(|| PipelineError::input_incomplete(column))
    }
}

/// Attaches `TotalBsmtSF` as the sum of the three basement sub-areas.
///
/// The external request schema omits this aggregate while the training data
/// carried it, so it must be restored before [`derive`] runs. The sub-areas
/// themselves are kept.
pub fn attach_basement_total(mut record: FeatureRecord) -> Result<FeatureRecord, PipelineError> {
    let total = record.require_number(BSMT_FIN_SF1)?
        + record.require_number(BSMT_FIN_SF2)?
        + record.require_number(BSMT_UNF_SF)?;
    record.insert(TOTAL_BSMT_SF, total);
    Ok(record)
}

/// Adds `TotalSF`, `HouseAge` and `WasRemodeled`, then drops the six raw
/// columns they were computed from.
///
/// All inputs are read before anything is modified. Running this on its own
/// output fails with `InputIncomplete` since the consumed columns are gone.
pub fn derive(mut record: FeatureRecord) -> Result<FeatureRecord, PipelineError> {
    let total_bsmt_sf = record.require_number(TOTAL_BSMT_SF)?;
    let first_flr_sf = record.require_number(FIRST_FLR_SF)?;
    let second_flr_sf = record.require_number(SECOND_FLR_SF)?;
    let yr_sold = record.require_number(YR_SOLD)?;
    let year_built = record.require_number(YEAR_BUILT)?;
    let year_remod_add = record.require_number(YEAR_REMOD_ADD)?;

    record.insert(TOTAL_SF, total_bsmt_sf + first_flr_sf + second_flr_sf);
    record.insert(HOUSE_AGE, yr_sold - year_built);
    record.insert(
        WAS_REMODELED,
        if year_remod_add != year_built { 1.0 } else { 0.0 },
    );

    for column in CONSUMED_COLUMNS {
        record.remove(column);
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> FeatureRecord {
        let mut record = FeatureRecord::new();
        record.insert(BSMT_FIN_SF1, 706_i64);
        record.insert(BSMT_FIN_SF2, 0_i64);
        record.insert(BSMT_UNF_SF, 150_i64);
        record.insert(FIRST_FLR_SF, 856_i64);
        record.insert(SECOND_FLR_SF, 854_i64);
        record.insert(YR_SOLD, 2010_i64);
        record.insert(YEAR_BUILT, 2000_i64);
        record.insert(YEAR_REMOD_ADD, 2005_i64);
        record.insert("Neighborhood", "CollgCr");
        record
    }

    #[test]
    fn basement_total_sums_sub_areas() {
        let record = attach_basement_total(raw()).unwrap();
        assert_eq!(record.require_number(TOTAL_BSMT_SF).unwrap(), 856.0);
        assert!(record.contains(BSMT_FIN_SF1));
    }

    #[test]
    fn missing_sub_area_is_input_incomplete() {
        let mut record = raw();
        record.insert(BSMT_UNF_SF, FeatureValue::Missing);

        let err = attach_basement_total(record).unwrap_err();
        assert!(matches!(err, PipelineError::InputIncomplete { column } if column == BSMT_UNF_SF));
    }

    #[test]
    fn text_in_formula_column_is_input_incomplete() {
        let mut record = attach_basement_total(raw()).unwrap();
        record.insert(YEAR_BUILT, "2000");

        assert!(derive(record).unwrap_err().is_input_incomplete());
    }

    #[test]
    fn derive_leaves_unrelated_columns_alone() {
        let derived = derive(attach_basement_total(raw()).unwrap()).unwrap();
        assert_eq!(
            derived.get("Neighborhood"),
            Some(&FeatureValue::Text("CollgCr".to_string()))
        );
        assert_eq!(derived.require_number(BSMT_FIN_SF1).unwrap(), 706.0);
    }

    #[test]
    fn untagged_values_parse_from_json() {
        let record: FeatureRecord =
            serde_json::from_str(r#"{"a": 1.5, "b": "x", "c": null}"#).unwrap();
        assert_eq!(record.get("a"), Some(&FeatureValue::Number(1.5)));
        assert_eq!(record.get("b"), Some(&FeatureValue::Text("x".to_string())));
        assert_eq!(record.get("c"), Some(&FeatureValue::Missing));
    }
}
