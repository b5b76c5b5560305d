use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::info;

use crate::error::SimulationError;
use crate::models::{BracketTable, BracketTableError};

/// Registry of [`BracketTable`] rule sets, keyed by fiscal year.
///
/// Readers take a cheap snapshot of the current map and never block each
/// other. Writers build a new map and swap it in, so a simulation that
/// already holds a table keeps the version it started with.
///
/// Typical lifetime:
/// 1. Create with `BracketTableRegistry::new()` or `from_tables`.
/// 2. Call `register` once per fiscal year, or `replace_all` on reload.
/// 3. Call `get` for every simulation.
#[derive(Debug, Default)]
pub struct BracketTableRegistry {
    tables: RwLock<Arc<HashMap<i32, Arc<BracketTable>>>>,
}

impl BracketTableRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry holding every table in `tables`.
    ///
    /// # Errors
    /// Returns the first validation failure. Nothing is registered then.
    pub fn from_tables(
        tables: impl IntoIterator<Item = BracketTable>
    ) -> Result<Self, BracketTableError> {
        let registry = Self::new();
        registry.replace_all(tables)?;
        Ok(registry)
    }

    /// Register a rule set, replacing any table already held for its year.
    ///
    /// # Errors
    /// Returns the table's validation error. The registry is left untouched.
    pub fn register(
        &self,
        table: BracketTable,
    ) -> Result<(), BracketTableError> {
        table.validate()?;
        let year = table.fiscal_year;

        let mut guard = self.write_guard();
        let mut next = HashMap::clone(&guard);
        let replaced = next.insert(year, Arc::new(table)).is_some();
        *guard = Arc::new(next);

        info!(fiscal_year = year, replaced, "registered bracket table");
        Ok(())
    }

    /// Swap in a complete set of rule sets at once.
    ///
    /// # Errors
    /// Returns the first validation failure. The previous tables stay in
    /// place.
    pub fn replace_all(
        &self,
        tables: impl IntoIterator<Item = BracketTable>,
    ) -> Result<(), BracketTableError> {
        let mut next = HashMap::new();
        for table in tables {
            table.validate()?;
            next.insert(table.fiscal_year, Arc::new(table));
        }

        let count = next.len();
        *self.write_guard() = Arc::new(next);

        info!(tables = count, "replaced bracket tables");
        Ok(())
    }

    /// The rule set for `fiscal_year`.
    ///
    /// # Errors
    /// * [`SimulationError::UnknownFiscalYear`] if no table is registered.
    pub fn get(
        &self,
        fiscal_year: i32,
    ) -> Result<Arc<BracketTable>, SimulationError> {
        self.snapshot()
            .get(&fiscal_year)
            .cloned()
            .ok_or(SimulationError::UnknownFiscalYear(fiscal_year))
    }

    /// Every registered fiscal year, ascending.
    pub fn fiscal_years(&self) -> Vec<i32> {
        let mut years: Vec<_> = self.snapshot().keys().copied().collect();
        years.sort_unstable();
        years
    }

    /// Most recent registered fiscal year.
    pub fn latest_fiscal_year(&self) -> Option<i32> {
        self.snapshot().keys().copied().max()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn snapshot(&self) -> Arc<HashMap<i32, Arc<BracketTable>>> {
        // A poisoned lock still holds a fully built map: writers only ever
        // assign a finished Arc.
        match self.tables.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn write_guard(&self) -> std::sync::RwLockWriteGuard<'_, Arc<HashMap<i32, Arc<BracketTable>>>> {
        self.tables
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// tests
// ─────────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use std::thread;

    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::IncomeTaxBracket;

    fn table(fiscal_year: i32) -> BracketTable {
        BracketTable {
            fiscal_year,
            corporate_tax_threshold: dec!(42500),
            corporate_tax_rate_below: dec!(0.15),
            corporate_tax_rate_above: dec!(0.25),
            dividend_flat_tax_rate: dec!(0.30),
            social_contribution_rate: dec!(0.45),
            income_tax_brackets: vec![
                IncomeTaxBracket::bounded(dec!(11497), dec!(0)),
                IncomeTaxBracket::unbounded(dec!(0.30)),
            ],
        }
    }

    #[test]
    fn get_returns_registered_table() {
        let registry = BracketTableRegistry::new();
        registry.register(table(2025)).unwrap();

        let found = registry.get(2025).unwrap();

        assert_eq!(found.fiscal_year, 2025);
        assert_eq!(found.social_contribution_rate, dec!(0.45));
    }

    #[test]
    fn get_unknown_year_is_an_error() {
        let registry = BracketTableRegistry::from_tables([table(2025)]).unwrap();

        assert_eq!(
            registry.get(1999).unwrap_err(),
            SimulationError::UnknownFiscalYear(1999)
        );
    }

    #[test]
    fn register_replaces_same_year() {
        let registry = BracketTableRegistry::new();
        registry.register(table(2025)).unwrap();

        let mut updated = table(2025);
        updated.dividend_flat_tax_rate = dec!(0.314);
        registry.register(updated).unwrap();

        assert_eq!(registry.fiscal_years(), vec![2025]);
        assert_eq!(registry.get(2025).unwrap().dividend_flat_tax_rate, dec!(0.314));
    }

    #[test]
    fn register_rejects_invalid_table() {
        let registry = BracketTableRegistry::new();
        let mut invalid = table(2025);
        invalid.social_contribution_rate = dec!(1.2);

        assert!(registry.register(invalid).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn replace_all_keeps_previous_tables_on_failure() {
        let registry = BracketTableRegistry::from_tables([table(2024)]).unwrap();
        let mut invalid = table(2026);
        invalid.income_tax_brackets.clear();

        let result = registry.replace_all([table(2025), invalid]);

        assert!(result.is_err());
        assert_eq!(registry.fiscal_years(), vec![2024]);
    }

    #[test]
    fn fiscal_years_are_sorted() {
        let registry =
            BracketTableRegistry::from_tables([table(2025), table(2023), table(2024)]).unwrap();

        assert_eq!(registry.fiscal_years(), vec![2023, 2024, 2025]);
        assert_eq!(registry.latest_fiscal_year(), Some(2025));
    }

    #[test]
    fn held_table_survives_replacement() {
        let registry = BracketTableRegistry::from_tables([table(2025)]).unwrap();
        let held = registry.get(2025).unwrap();

        let mut updated = table(2025);
        updated.corporate_tax_threshold = dec!(50000);
        registry.replace_all([updated]).unwrap();

        assert_eq!(held.corporate_tax_threshold, dec!(42500));
        assert_eq!(registry.get(2025).unwrap().corporate_tax_threshold, dec!(50000));
    }

    #[test]
    fn concurrent_readers_see_complete_tables() {
        let registry = Arc::new(BracketTableRegistry::from_tables([table(2025)]).unwrap());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let current = registry.get(2025).unwrap();
                        assert!(current.validate().is_ok());
                        assert_eq!(current.income_tax_brackets.len(), 2);
                    }
                })
            })
            .collect();

        for step in 0..100 {
            let mut updated = table(2025);
            updated.corporate_tax_threshold = dec!(42500) + Decimal::from(step);
            registry.register(updated).unwrap();
        }

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(
            registry.get(2025).unwrap().corporate_tax_threshold,
            dec!(42599)
        );
    }
}
