use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    #[serde(rename = "Conforme")]
    Conforme,
    #[serde(rename = "Não Conforme")]
    NaoConforme,
    #[serde(rename = "NA")]
    NotApplicable,
}

impl Answer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Answer::Conforme => "Conforme",
            Answer::NaoConforme => "Não Conforme",
            Answer::NotApplicable => "NA",
        }
    }
}
