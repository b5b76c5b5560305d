use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use remun_data::RuleSetLoader;

/// Validate rule-set CSV files and summarize every fiscal year they define.
///
/// Without arguments the built-in rule sets are checked.
///
/// The parameters file has the columns `fiscal_year`,
/// `corporate_tax_threshold`, `corporate_tax_rate_below`,
/// `corporate_tax_rate_above`, `dividend_flat_tax_rate` and
/// `social_contribution_rate`. The brackets file has `fiscal_year`,
/// `upper_threshold` (empty for the top bracket) and `marginal_rate`.
#[derive(Parser, Debug)]
#[command(name = "remun-rules")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the fiscal parameters CSV file
    #[arg(short, long, requires = "brackets")]
    parameters: Option<PathBuf>,

    /// Path to the income tax brackets CSV file
    #[arg(short, long, requires = "parameters")]
    brackets: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let tables = match (&args.parameters, &args.brackets) {
        (Some(parameters), Some(brackets)) => {
            println!(
                "Validating rule sets from: {} and {}",
                parameters.display(),
                brackets.display()
            );
            RuleSetLoader::read_files(parameters, brackets).with_context(|| {
                format!(
                    "Failed to load rule sets from: {} and {}",
                    parameters.display(),
                    brackets.display()
                )
            })?
        }
        _ => {
            println!("Validating built-in rule sets");
            RuleSetLoader::builtin().context("Failed to load built-in rule sets")?
        }
    };

    for table in &tables {
        let thresholds: Vec<String> = table.thresholds().map(|t| t.to_string()).collect();
        println!(
            "{}: {} brackets (thresholds {}), corporate {} / {} above {}, flat tax {}, social {}",
            table.fiscal_year,
            table.income_tax_brackets.len(),
            thresholds.join(" / "),
            table.corporate_tax_rate_below,
            table.corporate_tax_rate_above,
            table.corporate_tax_threshold,
            table.dividend_flat_tax_rate,
            table.social_contribution_rate
        );
    }

    println!("Successfully validated {} rule sets.", tables.len());

    Ok(())
}
