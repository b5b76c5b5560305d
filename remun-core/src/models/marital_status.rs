use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    #[default]
    Single,
    Married,
    CivilUnion,
}

impl MaritalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Married => "married",
            Self::CivilUnion => "civil_union",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single" => Some(Self::Single),
            "married" => Some(Self::Married),
            "civil_union" => Some(Self::CivilUnion),
            _ => None,
        }
    }

    /// Household parts before any dependants: one per adult.
    pub fn default_fiscal_parts(&self) -> Decimal {
        match self {
            Self::Single => Decimal::ONE,
            Self::Married | Self::CivilUnion => Decimal::TWO,
        }
    }
}
