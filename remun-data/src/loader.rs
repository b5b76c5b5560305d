use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use remun_core::{BracketTable, BracketTableError, BracketTableRegistry, IncomeTaxBracket};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

const BUILTIN_PARAMETERS: &str = include_str!("../data/fiscal_parameters.csv");
const BUILTIN_BRACKETS: &str = include_str!("../data/income_tax_brackets.csv");

/// Errors that can occur when loading rule sets.
#[derive(Debug, Error)]
pub enum RuleSetLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fiscal year {0} appears more than once in the parameters file")]
    DuplicateParameters(i32),

    #[error("fiscal year {0} has income tax brackets but no fiscal parameters")]
    MissingParameters(i32),

    #[error("fiscal year {0} has fiscal parameters but no income tax brackets")]
    MissingBrackets(i32),

    #[error("invalid rule set for fiscal year {fiscal_year}: {source}")]
    InvalidTable {
        fiscal_year: i32,
        #[source]
        source: BracketTableError,
    },

    #[error("registry rejected rule set: {0}")]
    Registry(#[from] BracketTableError),
}

impl From<csv::Error> for RuleSetLoaderError {
    fn from(err: csv::Error) -> Self {
        RuleSetLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the fiscal parameters CSV file.
///
/// - `fiscal_year`: The fiscal year (e.g., 2025)
/// - `corporate_tax_threshold`: Profit taxed at the reduced corporate rate
/// - `corporate_tax_rate_below` / `corporate_tax_rate_above`: Corporate rates
/// - `dividend_flat_tax_rate`: Flat rate on gross dividends
/// - `social_contribution_rate`: Blended contribution rate on gross salary
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FiscalParametersRecord {
    pub fiscal_year: i32,
    pub corporate_tax_threshold: Decimal,
    pub corporate_tax_rate_below: Decimal,
    pub corporate_tax_rate_above: Decimal,
    pub dividend_flat_tax_rate: Decimal,
    pub social_contribution_rate: Decimal,
}

/// A single record from the income tax brackets CSV file.
///
/// Rows for one fiscal year are taken in file order. An empty
/// `upper_threshold` marks the unbounded top bracket.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IncomeTaxBracketRecord {
    pub fiscal_year: i32,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_threshold: Option<Decimal>,
    pub marginal_rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for fiscal-year rule sets from CSV files.
///
/// Rule sets are split across two files: one row of scalar parameters per
/// fiscal year, and the ordered progressive schedule for each year. They are
/// joined on `fiscal_year`, validated, and handed to a
/// [`BracketTableRegistry`].
pub struct RuleSetLoader;

impl RuleSetLoader {
    /// Parse fiscal parameter records from a CSV reader.
    pub fn parse_parameters<R: Read>(
        reader: R
    ) -> Result<Vec<FiscalParametersRecord>, RuleSetLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: FiscalParametersRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Parse income tax bracket records from a CSV reader.
    pub fn parse_brackets<R: Read>(
        reader: R
    ) -> Result<Vec<IncomeTaxBracketRecord>, RuleSetLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: IncomeTaxBracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Join parameters and brackets into validated tables, ascending by
    /// fiscal year.
    ///
    /// Every fiscal year must appear in both files, and parameters at most
    /// once.
    pub fn build(
        parameters: &[FiscalParametersRecord],
        brackets: &[IncomeTaxBracketRecord],
    ) -> Result<Vec<BracketTable>, RuleSetLoaderError> {
        let mut schedules: BTreeMap<i32, Vec<IncomeTaxBracket>> = BTreeMap::new();
        for record in brackets {
            schedules
                .entry(record.fiscal_year)
                .or_default()
                .push(IncomeTaxBracket {
                    upper_threshold: record.upper_threshold,
                    marginal_rate: record.marginal_rate,
                });
        }

        let mut tables: BTreeMap<i32, BracketTable> = BTreeMap::new();
        for record in parameters {
            let year = record.fiscal_year;
            if tables.contains_key(&year) {
                return Err(RuleSetLoaderError::DuplicateParameters(year));
            }

            let income_tax_brackets = schedules
                .remove(&year)
                .ok_or(RuleSetLoaderError::MissingBrackets(year))?;

            let table = BracketTable {
                fiscal_year: year,
                corporate_tax_threshold: record.corporate_tax_threshold,
                corporate_tax_rate_below: record.corporate_tax_rate_below,
                corporate_tax_rate_above: record.corporate_tax_rate_above,
                dividend_flat_tax_rate: record.dividend_flat_tax_rate,
                social_contribution_rate: record.social_contribution_rate,
                income_tax_brackets,
            };
            validate(&table)?;

            debug!(
                fiscal_year = year,
                brackets = table.income_tax_brackets.len(),
                "built rule set"
            );
            tables.insert(year, table);
        }

        // Anything left over had brackets but no parameters.
        if let Some(&year) = schedules.keys().next() {
            return Err(RuleSetLoaderError::MissingParameters(year));
        }

        Ok(tables.into_values().collect())
    }

    /// Parse and build rule sets from two CSV readers.
    pub fn read<P: Read, B: Read>(
        parameters: P,
        brackets: B,
    ) -> Result<Vec<BracketTable>, RuleSetLoaderError> {
        let parameters = Self::parse_parameters(parameters)?;
        let brackets = Self::parse_brackets(brackets)?;
        Self::build(&parameters, &brackets)
    }

    /// Parse and build rule sets from two CSV files on disk.
    pub fn read_files(
        parameters: &Path,
        brackets: &Path,
    ) -> Result<Vec<BracketTable>, RuleSetLoaderError> {
        Self::read(open(parameters)?, open(brackets)?)
    }

    /// Rule sets compiled into the binary.
    pub fn builtin() -> Result<Vec<BracketTable>, RuleSetLoaderError> {
        Self::read(BUILTIN_PARAMETERS.as_bytes(), BUILTIN_BRACKETS.as_bytes())
    }

    /// Swap `tables` into `registry`, replacing whatever it held.
    ///
    /// Returns the number of fiscal years loaded.
    pub fn load(
        registry: &BracketTableRegistry,
        tables: Vec<BracketTable>,
    ) -> Result<usize, RuleSetLoaderError> {
        for table in &tables {
            validate(table)?;
        }

        let count = tables.len();
        registry.replace_all(tables)?;

        info!(
            fiscal_years = ?registry.fiscal_years(),
            "loaded rule sets"
        );
        Ok(count)
    }

    /// A registry holding the built-in rule sets.
    pub fn builtin_registry() -> Result<BracketTableRegistry, RuleSetLoaderError> {
        let registry = BracketTableRegistry::new();
        Self::load(&registry, Self::builtin()?)?;
        Ok(registry)
    }
}

fn validate(table: &BracketTable) -> Result<(), RuleSetLoaderError> {
    table
        .validate()
        .map_err(|source| RuleSetLoaderError::InvalidTable {
            fiscal_year: table.fiscal_year,
            source,
        })
}

fn open(path: &Path) -> Result<File, RuleSetLoaderError> {
    File::open(path).map_err(|source| RuleSetLoaderError::Io {
        path: path.display().to_string(),
        source,
    })
}
