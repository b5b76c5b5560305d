//! Fiscal-year rule sets: CSV parsing, validation, and the built-in tables.

mod loader;

pub use loader::{FiscalParametersRecord, IncomeTaxBracketRecord, RuleSetLoader, RuleSetLoaderError};
