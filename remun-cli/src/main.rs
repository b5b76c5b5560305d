use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use remun_core::{MaritalStatus, SimulationInput};
use rust_decimal::Decimal;
use tracing::{debug, info};

use remun_cli::report::{self, OutputFormat};
use remun_cli::utils::{parse_decimal, parse_marital_status};
use remun_cli::{app, batch, config, csv_loader, logging};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Salary/dividend split simulator for owner-managed companies.
///
/// Finds the gross salary that maximizes the owner's household net
/// disposable income, the rest of the profit being paid out as dividends.
#[derive(Debug, Parser)]
#[command(name = "remun", version, about)]
struct Cli {
    /// Configuration file (defaults to ./remun.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Simulate one household and print the three scenarios.
    Simulate(SimulateArgs),

    /// Print the registered rule set(s).
    Brackets {
        /// Fiscal year to print; every registered year when omitted.
        #[arg(long)]
        year: Option<i32>,
    },

    /// Simulate every row of a CSV file and write results as CSV to stdout.
    Batch {
        /// Input CSV (see the csv_loader module for columns).
        #[arg(long)]
        input: PathBuf,

        /// Fiscal year; the latest registered year when omitted.
        #[arg(long)]
        year: Option<i32>,
    },
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// Projected company revenue (e.g. `150,000`).
    #[arg(long, value_parser = parse_decimal)]
    revenue: Decimal,

    /// Deductible company expenses.
    #[arg(long, value_parser = parse_decimal)]
    expenses: Decimal,

    /// Marital status: single, married or civil_union.
    #[arg(long, value_parser = parse_marital_status, default_value = "single")]
    status: MaritalStatus,

    /// Household fiscal parts; 1 for single, 2 for couples when omitted.
    #[arg(long, value_parser = parse_decimal)]
    parts: Option<Decimal>,

    /// Other taxable household income sharing the progressive brackets.
    #[arg(long, value_parser = parse_decimal, default_value = "0")]
    other_income: Decimal,

    /// Existing household wealth (informational).
    #[arg(long, value_parser = parse_decimal, default_value = "0")]
    wealth: Decimal,

    /// Fiscal year; the latest registered year when omitted.
    #[arg(long)]
    year: Option<i32>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl SimulateArgs {
    fn input(&self) -> SimulationInput {
        SimulationInput {
            projected_revenue: self.revenue,
            deductible_expenses: self.expenses,
            marital_status: self.status,
            fiscal_parts: self
                .parts
                .unwrap_or_else(|| self.status.default_fiscal_parts()),
            other_household_income: self.other_income,
            existing_wealth: self.wealth,
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::load_config(cli.config.as_deref()).context("Failed to load config")?;
    logging::init_logging(config.log_level())?;

    let simulator = app::build_simulator(&config)?;
    debug!(fiscal_years = ?simulator.registry().fiscal_years(), "rule sets ready");

    match cli.command {
        Command::Simulate(args) => {
            let year = app::resolve_fiscal_year(simulator.registry(), args.year)?;
            let result = simulator
                .simulate(&args.input(), year)
                .context("Simulation failed")?;
            let rendered = report::render_result(&result, args.format)?;
            print!("{rendered}");
            if args.format == OutputFormat::Json {
                println!();
            }
        }
        Command::Brackets { year } => {
            let years = match year {
                Some(year) => vec![year],
                None => simulator.registry().fiscal_years(),
            };
            for (index, year) in years.into_iter().enumerate() {
                let table = simulator.get_bracket_table(year)?;
                if index > 0 {
                    println!();
                }
                print!("{}", report::render_table(&table));
            }
        }
        Command::Batch { input, year } => {
            let year = app::resolve_fiscal_year(simulator.registry(), year)?;
            let rows = csv_loader::load_from_file(&input)
                .with_context(|| format!("Failed to load batch input: {}", input.display()))?;
            info!(rows = rows.len(), fiscal_year = year, "running batch");

            let outcomes = batch::run_batch(Arc::new(simulator), rows, year).await;
            batch::write_csv(&outcomes, io::stdout().lock())
                .context("Failed to write batch results")?;
        }
    }

    Ok(())
}
