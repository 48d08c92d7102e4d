use crate::features::FeatureRecord;
use serde::{de, Deserialize, Deserializer, Serialize};

// ============ Request Models ============

/// Wire names of the text-valued request fields, encoded as categories.
///
/// Every other column reaching the preprocessor, derived ones included, is
/// numeric.
pub const CATEGORICAL_COLUMNS: [&str; 43] = [
    "MSZoning",
    "Street",
    "Alley",
    "LotShape",
    "LandContour",
    "Utilities",
    "LotConfig",
    "LandSlope",
    "Neighborhood",
    "Condition1",
    "Condition2",
    "BldgType",
    "HouseStyle",
    "RoofStyle",
    "RoofMatl",
    "Exterior1st",
    "Exterior2nd",
    "MasVnrType",
    "ExterQual",
    "ExterCond",
    "Foundation",
    "BsmtQual",
    "BsmtCond",
    "BsmtExposure",
    "BsmtFinType1",
    "BsmtFinType2",
    "Heating",
    "HeatingQC",
    "CentralAir",
    "Electrical",
    "KitchenQual",
    "Functional",
    "FireplaceQu",
    "GarageType",
    "GarageFinish",
    "GarageQual",
    "GarageCond",
    "PavedDrive",
    "PoolQC",
    "Fence",
    "MiscFeature",
    "SaleType",
    "SaleCondition",
];

/// One property's attributes as supplied by a caller.
///
/// Field names on the wire match the Ames training data, including the
/// digit-leading `1stFlrSF`, `2ndFlrSF` and `3SsnPorch`. `Option` fields are
/// the nullable subset and may be sent as `null` or omitted; every other
/// field is required. Unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HouseData {
    #[serde(rename = "MSSubClass", deserialize_with = "integral")]
    pub ms_sub_class: i64,
    #[serde(rename = "MSZoning")]
    pub ms_zoning: String,
    #[serde(rename = "LotFrontage")]
    pub lot_frontage: Option<f64>,
    #[serde(rename = "LotArea", deserialize_with = "integral")]
    pub lot_area: i64,
    #[serde(rename = "Street")]
    pub street: String,
    #[serde(rename = "Alley")]
    pub alley: Option<String>,
    #[serde(rename = "LotShape")]
    pub lot_shape: String,
    #[serde(rename = "LandContour")]
    pub land_contour: String,
    #[serde(rename = "Utilities")]
    pub utilities: String,
    #[serde(rename = "LotConfig")]
    pub lot_config: String,
    #[serde(rename = "LandSlope")]
    pub land_slope: String,
    #[serde(rename = "Neighborhood")]
    pub neighborhood: String,
    #[serde(rename = "Condition1")]
    pub condition1: String,
    #[serde(rename = "Condition2")]
    pub condition2: String,
    #[serde(rename = "BldgType")]
    pub bldg_type: String,
    #[serde(rename = "HouseStyle")]
    pub house_style: String,
    #[serde(rename = "OverallQual", deserialize_with = "integral")]
    pub overall_qual: i64,
    #[serde(rename = "OverallCond", deserialize_with = "integral")]
    pub overall_cond: i64,
    #[serde(rename = "YearBuilt", deserialize_with = "integral")]
    pub year_built: i64,
    #[serde(rename = "YearRemodAdd", deserialize_with = "integral")]
    pub year_remod_add: i64,
    #[serde(rename = "RoofStyle")]
    pub roof_style: String,
    #[serde(rename = "RoofMatl")]
    pub roof_matl: String,
    #[serde(rename = "Exterior1st")]
    pub exterior1st: String,
    #[serde(rename = "Exterior2nd")]
    pub exterior2nd: String,
    #[serde(rename = "MasVnrType")]
    pub mas_vnr_type: Option<String>,
    #[serde(rename = "MasVnrArea")]
    pub mas_vnr_area: Option<f64>,
    #[serde(rename = "ExterQual")]
    pub exter_qual: String,
    #[serde(rename = "ExterCond")]
    pub exter_cond: String,
    #[serde(rename = "Foundation")]
    pub foundation: String,
    #[serde(rename = "BsmtQual")]
    pub bsmt_qual: Option<String>,
    #[serde(rename = "BsmtCond")]
    pub bsmt_cond: Option<String>,
    #[serde(rename = "BsmtExposure")]
    pub bsmt_exposure: Option<String>,
    #[serde(rename = "BsmtFinType1")]
    pub bsmt_fin_type1: Option<String>,
    #[serde(rename = "BsmtFinSF1", deserialize_with = "integral")]
    pub bsmt_fin_sf1: i64,
    #[serde(rename = "BsmtFinType2")]
    pub bsmt_fin_type2: Option<String>,
    #[serde(rename = "BsmtFinSF2", deserialize_with = "integral")]
    pub bsmt_fin_sf2: i64,
    #[serde(rename = "BsmtUnfSF", deserialize_with = "integral")]
    pub bsmt_unf_sf: i64,
    #[serde(rename = "Heating")]
    pub heating: String,
    #[serde(rename = "HeatingQC")]
    pub heating_qc: String,
    #[serde(rename = "CentralAir")]
    pub central_air: String,
    #[serde(rename = "Electrical")]
    pub electrical: Option<String>,
    #[serde(rename = "1stFlrSF", deserialize_with = "integral")]
    pub first_flr_sf: i64,
    #[serde(rename = "2ndFlrSF", deserialize_with = "integral")]
    pub second_flr_sf: i64,
    #[serde(rename = "LowQualFinSF", deserialize_with = "integral")]
    pub low_qual_fin_sf: i64,
    #[serde(rename = "GrLivArea", deserialize_with = "integral")]
    pub gr_liv_area: i64,
    #[serde(rename = "BsmtFullBath", deserialize_with = "integral")]
    pub bsmt_full_bath: i64,
    #[serde(rename = "BsmtHalfBath", deserialize_with = "integral")]
    pub bsmt_half_bath: i64,
    #[serde(rename = "FullBath", deserialize_with = "integral")]
    pub full_bath: i64,
    #[serde(rename = "HalfBath", deserialize_with = "integral")]
    pub half_bath: i64,
    #[serde(rename = "BedroomAbvGr", deserialize_with = "integral")]
    pub bedroom_abv_gr: i64,
    #[serde(rename = "KitchenAbvGr", deserialize_with = "integral")]
    pub kitchen_abv_gr: i64,
    #[serde(rename = "KitchenQual")]
    pub kitchen_qual: String,
    #[serde(rename = "TotRmsAbvGrd", deserialize_with = "integral")]
    pub tot_rms_abv_grd: i64,
    #[serde(rename = "Functional")]
    pub functional: String,
    #[serde(rename = "Fireplaces", deserialize_with = "integral")]
    pub fireplaces: i64,
    #[serde(rename = "FireplaceQu")]
    pub fireplace_qu: Option<String>,
    #[serde(rename = "GarageType")]
    pub garage_type: Option<String>,
    #[serde(rename = "GarageYrBlt")]
    pub garage_yr_blt: Option<f64>,
    #[serde(rename = "GarageFinish")]
    pub garage_finish: Option<String>,
    #[serde(rename = "GarageCars", deserialize_with = "integral")]
    pub garage_cars: i64,
    #[serde(rename = "GarageArea", deserialize_with = "integral")]
    pub garage_area: i64,
    #[serde(rename = "GarageQual")]
    pub garage_qual: Option<String>,
    #[serde(rename = "GarageCond")]
    pub garage_cond: Option<String>,
    #[serde(rename = "PavedDrive")]
    pub paved_drive: String,
    #[serde(rename = "WoodDeckSF", deserialize_with = "integral")]
    pub wood_deck_sf: i64,
    #[serde(rename = "OpenPorchSF", deserialize_with = "integral")]
    pub open_porch_sf: i64,
    #[serde(rename = "EnclosedPorch", deserialize_with = "integral")]
    pub enclosed_porch: i64,
    #[serde(rename = "3SsnPorch", deserialize_with = "integral")]
    pub three_ssn_porch: i64,
    #[serde(rename = "ScreenPorch", deserialize_with = "integral")]
    pub screen_porch: i64,
    #[serde(rename = "PoolArea", deserialize_with = "integral")]
    pub pool_area: i64,
    #[serde(rename = "PoolQC")]
    pub pool_qc: Option<String>,
    #[serde(rename = "Fence")]
    pub fence: Option<String>,
    #[serde(rename = "MiscFeature")]
    pub misc_feature: Option<String>,
    #[serde(rename = "MiscVal", deserialize_with = "integral")]
    pub misc_val: i64,
    #[serde(rename = "MoSold", deserialize_with = "integral")]
    pub mo_sold: i64,
    #[serde(rename = "YrSold", deserialize_with = "integral")]
    pub yr_sold: i64,
    #[serde(rename = "SaleType")]
    pub sale_type: String,
    #[serde(rename = "SaleCondition")]
    pub sale_condition: String,
}

impl HouseData {
    /// Converts the typed request into the column record the pipeline consumes.
    ///
    /// Column names are the wire names; nullable fields that are absent
    /// become [`FeatureValue::Missing`](crate::features::FeatureValue::Missing).
    pub fn to_record(&self) -> FeatureRecord {
        let mut record = FeatureRecord::new();

        record.insert("MSSubClass", self.ms_sub_class);
        record.insert("MSZoning", self.ms_zoning.as_str());
        record.insert("LotFrontage", self.lot_frontage);
        record.insert("LotArea", self.lot_area);
        record.insert("Street", self.street.as_str());
        record.insert("Alley", self.alley.as_deref());
        record.insert("LotShape", self.lot_shape.as_str());
        record.insert("LandContour", self.land_contour.as_str());
        record.insert("Utilities", self.utilities.as_str());
        record.insert("LotConfig", self.lot_config.as_str());
        record.insert("LandSlope", self.land_slope.as_str());
        record.insert("Neighborhood", self.neighborhood.as_str());
        record.insert("Condition1", self.condition1.as_str());
        record.insert("Condition2", self.condition2.as_str());
        record.insert("BldgType", self.bldg_type.as_str());
        record.insert("HouseStyle", self.house_style.as_str());
        record.insert("OverallQual", self.overall_qual);
        record.insert("OverallCond", self.overall_cond);
        record.insert("YearBuilt", self.year_built);
        record.insert("YearRemodAdd", self.year_remod_add);
        record.insert("RoofStyle", self.roof_style.as_str());
        record.insert("RoofMatl", self.roof_matl.as_str());
        record.insert("Exterior1st", self.exterior1st.as_str());
        record.insert("Exterior2nd", self.exterior2nd.as_str());
        record.insert("MasVnrType", self.mas_vnr_type.as_deref());
        record.insert("MasVnrArea", self.mas_vnr_area);
        record.insert("ExterQual", self.exter_qual.as_str());
        record.insert("ExterCond", self.exter_cond.as_str());
        record.insert("Foundation", self.foundation.as_str());
        record.insert("BsmtQual", self.bsmt_qual.as_deref());
        record.insert("BsmtCond", self.bsmt_cond.as_deref());
        record.insert("BsmtExposure", self.bsmt_exposure.as_deref());
        record.insert("BsmtFinType1", self.bsmt_fin_type1.as_deref());
        record.insert("BsmtFinSF1", self.bsmt_fin_sf1);
        record.insert("BsmtFinType2", self.bsmt_fin_type2.as_deref());
        record.insert("BsmtFinSF2", self.bsmt_fin_sf2);
        record.insert("BsmtUnfSF", self.bsmt_unf_sf);
        record.insert("Heating", self.heating.as_str());
        record.insert("HeatingQC", self.heating_qc.as_str());
        record.insert("CentralAir", self.central_air.as_str());
        record.insert("Electrical", self.electrical.as_deref());
        record.insert("1stFlrSF", self.first_flr_sf);
        record.insert("2ndFlrSF", self.second_flr_sf);
        record.insert("LowQualFinSF", self.low_qual_fin_sf);
        record.insert("GrLivArea", self.gr_liv_area);
        record.insert("BsmtFullBath", self.bsmt_full_bath);
        record.insert("BsmtHalfBath", self.bsmt_half_bath);
        record.insert("FullBath", self.full_bath);
        record.insert("HalfBath", self.half_bath);
        record.insert("BedroomAbvGr", self.bedroom_abv_gr);
        record.insert("KitchenAbvGr", self.kitchen_abv_gr);
        record.insert("KitchenQual", self.kitchen_qual.as_str());
        record.insert("TotRmsAbvGrd", self.tot_rms_abv_grd);
        record.insert("Functional", self.functional.as_str());
        record.insert("Fireplaces", self.fireplaces);
        record.insert("FireplaceQu", self.fireplace_qu.as_deref());
        record.insert("GarageType", self.garage_type.as_deref());
        record.insert("GarageYrBlt", self.garage_yr_blt);
        record.insert("GarageFinish", self.garage_finish.as_deref());
        record.insert("GarageCars", self.garage_cars);
        record.insert("GarageArea", self.garage_area);
        record.insert("GarageQual", self.garage_qual.as_deref());
        record.insert("GarageCond", self.garage_cond.as_deref());
        record.insert("PavedDrive", self.paved_drive.as_str());
        record.insert("WoodDeckSF", self.wood_deck_sf);
        record.insert("OpenPorchSF", self.open_porch_sf);
        record.insert("EnclosedPorch", self.enclosed_porch);
        record.insert("3SsnPorch", self.three_ssn_porch);
        record.insert("ScreenPorch", self.screen_porch);
        record.insert("PoolArea", self.pool_area);
        record.insert("PoolQC", self.pool_qc.as_deref());
        record.insert("Fence", self.fence.as_deref());
        record.insert("MiscFeature", self.misc_feature.as_deref());
        record.insert("MiscVal", self.misc_val);
        record.insert("MoSold", self.mo_sold);
        record.insert("YrSold", self.yr_sold);
        record.insert("SaleType", self.sale_type.as_str());
        record.insert("SaleCondition", self.sale_condition.as_str());

        record
    }

    /// The first house of the Ames training set (sold for $208,500).
    pub fn example() -> Self {
        Self {
            ms_sub_class: 60,
            ms_zoning: "RL".to_string(),
            lot_frontage: Some(65.0),
            lot_area: 8450,
            street: "Pave".to_string(),
            alley: None,
            lot_shape: "Reg".to_string(),
            land_contour: "Lvl".to_string(),
            utilities: "AllPub".to_string(),
            lot_config: "Inside".to_string(),
            land_slope: "Gtl".to_string(),
            neighborhood: "CollgCr".to_string(),
            condition1: "Norm".to_string(),
            condition2: "Norm".to_string(),
            bldg_type: "1Fam".to_string(),
            house_style: "2Story".to_string(),
            overall_qual: 7,
            overall_cond: 5,
            year_built: 2003,
            year_remod_add: 2003,
            roof_style: "Gable".to_string(),
            roof_matl: "CompShg".to_string(),
            exterior1st: "VinylSd".to_string(),
            exterior2nd: "VinylSd".to_string(),
            mas_vnr_type: Some("BrkFace".to_string()),
            mas_vnr_area: Some(196.0),
            exter_qual: "Gd".to_string(),
            exter_cond: "TA".to_string(),
            foundation: "PConc".to_string(),
            bsmt_qual: Some("Gd".to_string()),
            bsmt_cond: Some("TA".to_string()),
            bsmt_exposure: Some("No".to_string()),
            bsmt_fin_type1: Some("GLQ".to_string()),
            bsmt_fin_sf1: 706,
            bsmt_fin_type2: Some("Unf".to_string()),
            bsmt_fin_sf2: 0,
            bsmt_unf_sf: 150,
            heating: "GasA".to_string(),
            heating_qc: "Ex".to_string(),
            central_air: "Y".to_string(),
            electrical: Some("SBrkr".to_string()),
            first_flr_sf: 856,
            second_flr_sf: 854,
            low_qual_fin_sf: 0,
            gr_liv_area: 1710,
            bsmt_full_bath: 1,
            bsmt_half_bath: 0,
            full_bath: 2,
            half_bath: 1,
            bedroom_abv_gr: 3,
            kitchen_abv_gr: 1,
            kitchen_qual: "Gd".to_string(),
            tot_rms_abv_grd: 8,
            functional: "Typ".to_string(),
            fireplaces: 0,
            fireplace_qu: None,
            garage_type: Some("Attchd".to_string()),
            garage_yr_blt: Some(2003.0),
            garage_finish: Some("RFn".to_string()),
            garage_cars: 2,
            garage_area: 548,
            garage_qual: Some("TA".to_string()),
            garage_cond: Some("TA".to_string()),
            paved_drive: "Y".to_string(),
            wood_deck_sf: 0,
            open_porch_sf: 61,
            enclosed_porch: 0,
            three_ssn_porch: 0,
            screen_porch: 0,
            pool_area: 0,
            pool_qc: None,
            fence: None,
            misc_feature: None,
            misc_val: 0,
            mo_sold: 2,
            yr_sold: 2008,
            sale_type: "WD".to_string(),
            sale_condition: "Normal".to_string(),
        }
    }
}

/// Accepts an integer, or a float with no fractional part such as `1710.0`.
fn integral<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(i64),
        Float(f64),
    }

    match Number::deserialize(deserializer)? {
        Number::Int(value) => Ok(value),
        Number::Float(value)
            if value.fract() == 0.0 && value.abs() <= i64::MAX as f64 =>
        {
            Ok(value as i64)
        }
        Number::Float(value) => Err(de::Error::custom(format!(
            "expected an integer, got {}",
            value
        ))),
    }
}

/// A house paired with its observed sale price, used for offline evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledHouse {
    pub record: HouseData,
    pub sale_price: f64,
}

// ============ Response Models ============

/// Successful prediction response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Raw estimate on the price scale.
    pub predicted_price: f64,
    /// Presentation string, e.g. `$208,500.00`.
    pub predicted_price_formatted: String,
}
