//! Patient record and the name-keyed feature row fed to the classifier

use crate::error::InferenceError;
use crate::labels::Locale;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One cell of a feature row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FeatureValue {
    /// Numeric view of the value, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Int(v) => Some(*v as f64),
            FeatureValue::Float(v) => Some(*v),
            FeatureValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Float(v)
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Int(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Text(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        FeatureValue::Text(v)
    }
}

/// A single table row addressed by column name.
///
/// Column order carries no meaning; the pipeline resolves inputs by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRow(BTreeMap<String, FeatureValue>);

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FeatureValue> {
        self.0.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FeatureValue> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

}

/// Column names in the order the survey dataset lists them.
pub const FEATURE_NAMES: [&str; 16] = [
    "Age",
    "Gender",
    "Height",
    "Weight",
    "family_history",
    "FAVC",
    "FCVC",
    "NCP",
    "CAEC",
    "SMOKE",
    "CH2O",
    "SCC",
    "FAF",
    "TUE",
    "CALC",
    "MTRANS",
];

/// Inclusive domain of each numeric field as collected by the form.
pub const NUMERIC_DOMAINS: [(&str, f64, f64); 8] = [
    ("Age", 10.0, 100.0),
    ("Height", 1.0, 2.5),
    ("Weight", 30.0, 200.0),
    ("FCVC", 1.0, 3.0),
    ("NCP", 1.0, 4.0),
    ("CH2O", 1.0, 3.0),
    ("FAF", 0.0, 3.0),
    ("TUE", 0.0, 2.0),
];

/// A single inference request as submitted from the simulator form.
///
/// Categorical fields hold the raw English codes the model was trained on
/// (see [`crate::labels::Locale::decode_choice`] for form-language input).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Age in years
    #[serde(rename = "Age")]
    pub age: f64,

    /// Male or Female
    #[serde(rename = "Gender")]
    pub gender: String,

    /// Height in meters
    #[serde(rename = "Height")]
    pub height: f64,

    /// Weight in kilograms
    #[serde(rename = "Weight")]
    pub weight: f64,

    /// Family history of obesity (yes/no)
    pub family_history: String,

    /// Frequent high-caloric food consumption (yes/no)
    #[serde(rename = "FAVC")]
    pub favc: String,

    /// Vegetable consumption frequency, 1-3
    #[serde(rename = "FCVC")]
    pub fcvc: f64,

    /// Main meals per day, 1-4
    #[serde(rename = "NCP")]
    pub ncp: f64,

    /// Eating between meals (no/Sometimes/Frequently/Always)
    #[serde(rename = "CAEC")]
    pub caec: String,

    /// Smoker (yes/no)
    #[serde(rename = "SMOKE")]
    pub smoke: String,

    /// Water intake in liters per day, 1-3
    #[serde(rename = "CH2O")]
    pub ch2o: f64,

    /// Monitors calorie intake (yes/no)
    #[serde(rename = "SCC")]
    pub scc: String,

    /// Physical activity frequency, 0-3
    #[serde(rename = "FAF")]
    pub faf: f64,

    /// Time using electronic devices, 0-2
    #[serde(rename = "TUE")]
    pub tue: f64,

    /// Alcohol consumption (no/Sometimes/Frequently/Always)
    #[serde(rename = "CALC")]
    pub calc: String,

    /// Usual transportation
    #[serde(rename = "MTRANS")]
    pub mtrans: String,
}

impl PatientRecord {
    /// Build the name-keyed row the pipeline consumes.
    pub fn to_row(&self) -> FeatureRow {
        FeatureRow::new()
            .with("Age", self.age)
            .with("Gender", self.gender.as_str())
            .with("Height", self.height)
            .with("Weight", self.weight)
            .with("family_history", self.family_history.as_str())
            .with("FAVC", self.favc.as_str())
            .with("FCVC", self.fcvc)
            .with("NCP", self.ncp)
            .with("CAEC", self.caec.as_str())
            .with("SMOKE", self.smoke.as_str())
            .with("CH2O", self.ch2o)
            .with("SCC", self.scc.as_str())
            .with("FAF", self.faf)
            .with("TUE", self.tue)
            .with("CALC", self.calc.as_str())
            .with("MTRANS", self.mtrans.as_str())
    }

    fn numeric(&self, name: &str) -> Option<f64> {
        match name {
            "Age" => Some(self.age),
            "Height" => Some(self.height),
            "Weight" => Some(self.weight),
            "FCVC" => Some(self.fcvc),
            "NCP" => Some(self.ncp),
            "CH2O" => Some(self.ch2o),
            "FAF" => Some(self.faf),
            "TUE" => Some(self.tue),
            _ => None,
        }
    }

    /// Check every numeric field against its form domain.
    pub fn check_ranges(&self) -> Result<(), InferenceError> {
        for (name, min, max) in NUMERIC_DOMAINS {
            let Some(value) = self.numeric(name) else {
                continue;
            };
            if !value.is_finite() || value < min || value > max {
                return Err(InferenceError::OutOfRange {
                    feature: name.to_string(),
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Replace form choices shown in `locale` with the raw model codes.
    pub fn decode_choices(&self, locale: Locale) -> Self {
        let decode = |field: &str, shown: &str| locale.decode_choice(field, shown).to_string();
        Self {
            gender: decode("Gender", &self.gender),
            family_history: decode("family_history", &self.family_history),
            favc: decode("FAVC", &self.favc),
            caec: decode("CAEC", &self.caec),
            smoke: decode("SMOKE", &self.smoke),
            scc: decode("SCC", &self.scc),
            calc: decode("CALC", &self.calc),
            mtrans: decode("MTRANS", &self.mtrans),
            ..self.clone()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_record() -> PatientRecord {
        PatientRecord {
            age: 30.0,
            gender: "Male".to_string(),
            height: 1.70,
            weight: 130.0,
            family_history: "yes".to_string(),
            favc: "yes".to_string(),
            fcvc: 2.4,
            ncp: 3.0,
            caec: "Sometimes".to_string(),
            smoke: "no".to_string(),
            ch2o: 2.0,
            scc: "no".to_string(),
            faf: 1.0,
            tue: 1.0,
            calc: "no".to_string(),
            mtrans: "Automobile".to_string(),
        }
    }

    #[test]
    fn test_record_uses_model_column_names() {
        let json = serde_json::to_value(sample_record()).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 16);
        for name in FEATURE_NAMES {
            assert!(obj.contains_key(name), "missing column {name}");
        }
    }

    #[test]
    fn test_to_row_has_all_features() {
        let row = sample_record().to_row();

        assert_eq!(row.len(), FEATURE_NAMES.len());
        assert_eq!(row.get("FCVC"), Some(&FeatureValue::Float(2.4)));
        assert_eq!(row.get("MTRANS").and_then(FeatureValue::as_str), Some("Automobile"));
    }

    #[test]
    fn test_check_ranges() {
        assert!(sample_record().check_ranges().is_ok());

        let mut record = sample_record();
        record.height = 2.6;
        assert!(matches!(
            record.check_ranges(),
            Err(InferenceError::OutOfRange { ref feature, .. }) if feature == "Height"
        ));

        let mut record = sample_record();
        record.faf = f64::NAN;
        assert!(record.check_ranges().is_err());

        let mut record = sample_record();
        record.tue = 2.0;
        record.faf = 0.0;
        assert!(record.check_ranges().is_ok());
    }

    #[test]
    fn test_feature_value_untagged() {
        let row: FeatureRow =
            serde_json::from_str(r#"{"NCP": 3, "FCVC": 2.4, "Gender": "Male"}"#).unwrap();

        assert_eq!(row.get("NCP"), Some(&FeatureValue::Int(3)));
        assert_eq!(row.get("FCVC"), Some(&FeatureValue::Float(2.4)));
        assert_eq!(row.get("Gender"), Some(&FeatureValue::Text("Male".to_string())));
    }

    #[test]
    fn test_decode_choices() {
        let mut form = sample_record();
        form.gender = "Feminino".to_string();
        form.caec = "Às vezes".to_string();
        form.mtrans = "Caminhada".to_string();
        form.smoke = "Sim".to_string();

        let record = form.decode_choices(Locale::PtBr);
        assert_eq!(record.gender, "Female");
        assert_eq!(record.caec, "Sometimes");
        assert_eq!(record.mtrans, "Walking");
        assert_eq!(record.smoke, "yes");
        assert_eq!(record.calc, "no");
        assert_eq!(record.fcvc, form.fcvc);

        assert_eq!(sample_record().decode_choices(Locale::En), sample_record());
    }
}
