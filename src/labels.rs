//! Display translation for model class labels and form choices.

use serde::{Deserialize, Serialize};

const EN_LABELS: [(&str, &str); 7] = [
    ("Insufficient_Weight", "Underweight"),
    ("Normal_Weight", "Normal Weight"),
    ("Overweight_Level_I", "Overweight Level I"),
    ("Overweight_Level_II", "Overweight Level II"),
    ("Obesity_Type_I", "Obesity Grade I"),
    ("Obesity_Type_II", "Obesity Grade II"),
    ("Obesity_Type_III", "Morbid Obesity"),
];

const PT_BR_LABELS: [(&str, &str); 7] = [
    ("Insufficient_Weight", "Abaixo do Peso"),
    ("Normal_Weight", "Peso Normal"),
    ("Overweight_Level_I", "Sobrepeso Nível I"),
    ("Overweight_Level_II", "Sobrepeso Nível II"),
    ("Obesity_Type_I", "Obesidade Grau I"),
    ("Obesity_Type_II", "Obesidade Grau II"),
    ("Obesity_Type_III", "Obesidade Mórbida"),
];

const PT_BR_GENDER: [(&str, &str); 2] = [("Masculino", "Male"), ("Feminino", "Female")];

const PT_BR_YES_NO: [(&str, &str); 2] = [("Sim", "yes"), ("Não", "no")];

const PT_BR_FREQUENCY: [(&str, &str); 4] = [
    ("Não", "no"),
    ("Às vezes", "Sometimes"),
    ("Frequentemente", "Frequently"),
    ("Sempre", "Always"),
];

const PT_BR_TRANSPORT: [(&str, &str); 5] = [
    ("Transporte Público", "Public_Transportation"),
    ("Caminhada", "Walking"),
    ("Carro", "Automobile"),
    ("Moto", "Motorbike"),
    ("Bicicleta", "Bike"),
];

fn lookup(table: &[(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Map a raw model label to its English display label.
///
/// Unknown labels are returned unchanged.
pub fn translate(raw_label: &str) -> &str {
    Locale::En.translate(raw_label)
}

/// Display language of the simulator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "pt-br", alias = "pt-BR", alias = "pt")]
    PtBr,
}

impl Locale {
    fn label_table(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Locale::En => &EN_LABELS,
            Locale::PtBr => &PT_BR_LABELS,
        }
    }

    /// Exact-match lookup of a raw label, falling back to the input.
    pub fn translate<'a>(&self, raw_label: &'a str) -> &'a str {
        lookup(self.label_table(), raw_label).unwrap_or(raw_label)
    }

    /// Map a form choice shown in this locale back to the raw code the model
    /// was trained on. Unrecognised choices pass through so the pipeline can
    /// reject them.
    pub fn decode_choice<'a>(&self, field: &str, shown: &'a str) -> &'a str {
        let table: &[(&str, &str)] = match (self, field) {
            (Locale::En, _) => return shown,
            (Locale::PtBr, "Gender") => &PT_BR_GENDER,
            (Locale::PtBr, "family_history" | "FAVC" | "SMOKE" | "SCC") => &PT_BR_YES_NO,
            (Locale::PtBr, "CAEC" | "CALC") => &PT_BR_FREQUENCY,
            (Locale::PtBr, "MTRANS") => &PT_BR_TRANSPORT,
            _ => return shown,
        };
        lookup(table, shown).unwrap_or(shown)
    }
}
