//! Human-readable rendering of simulation results and rule sets.

use std::fmt::Write;

use clap::ValueEnum;
use remun_core::calculations::common::format_amount;
use remun_core::{BracketTable, Scenario, SimulationResult};
use rust_decimal::Decimal;

use crate::utils::format_rate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Renders `result` in the requested format.
pub fn render_result(
    result: &SimulationResult,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(result)),
        OutputFormat::Json => serde_json::to_string_pretty(result),
    }
}

/// Three-column comparison of the scenarios, followed by recommendations.
pub fn render_text(result: &SimulationResult) -> String {
    let columns = [&result.optimal, &result.max_salary, &result.max_dividends];
    let rows: [(&str, fn(&Scenario) -> String); 8] = [
        ("Gross salary", |s| format_amount(s.gross_salary)),
        ("Social contributions", |s| format_amount(s.social_contributions)),
        ("Corporate tax", |s| format_amount(s.corporate_tax_due)),
        ("Gross dividends", |s| format_amount(s.gross_dividends)),
        ("Income tax on salary", |s| format_amount(s.income_tax_on_salary)),
        ("Tax on dividends", |s| format_amount(s.income_tax_on_dividends)),
        ("Net disposable income", |s| format_amount(s.net_disposable_income)),
        ("Effective tax rate", |s| format_rate(s.effective_overall_tax_rate)),
    ];

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Fiscal year {}, taxable base {}",
        result.fiscal_year,
        format_amount(result.taxable_base)
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<24}{:>16}{:>16}{:>16}",
        "", "Optimal", "All salary", "All dividends"
    );
    for (label, cell) in rows {
        let _ = write!(out, "{label:<24}");
        for scenario in columns {
            let _ = write!(out, "{:>16}", cell(scenario));
        }
        let _ = writeln!(out);
    }

    if !result.recommendations.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Recommendations:");
        for recommendation in &result.recommendations {
            let _ = writeln!(out, "  - {recommendation}");
        }
    }

    out
}

/// Parameters and progressive schedule of one rule set.
pub fn render_table(table: &BracketTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Fiscal year {}", table.fiscal_year);
    let _ = writeln!(
        out,
        "  Corporate tax          {} up to {}, {} above",
        format_rate(table.corporate_tax_rate_below),
        format_amount(table.corporate_tax_threshold),
        format_rate(table.corporate_tax_rate_above)
    );
    let _ = writeln!(
        out,
        "  Dividend flat tax      {}",
        format_rate(table.dividend_flat_tax_rate)
    );
    let _ = writeln!(
        out,
        "  Social contributions   {}",
        format_rate(table.social_contribution_rate)
    );
    let _ = writeln!(out, "  Income tax brackets (per part)");

    let mut lower = Decimal::ZERO;
    for bracket in &table.income_tax_brackets {
        let range = match bracket.upper_threshold {
            Some(upper) => format!("{} - {}", format_amount(lower), format_amount(upper)),
            None => format!("over {}", format_amount(lower)),
        };
        let _ = writeln!(
            out,
            "    {range:<28}{:>8}",
            format_rate(bracket.marginal_rate)
        );
        if let Some(upper) = bracket.upper_threshold {
            lower = upper;
        }
    }

    out
}
