//! Remuneration split engine for owner-managed companies.
//!
//! Given a company's projected profit and the owner's household situation,
//! [`Simulator::simulate`] finds the gross salary (the rest being paid out as
//! dividends) that maximizes the household's net disposable income, and
//! reports it next to the all-salary and all-dividend alternatives.

pub mod calculations;
pub mod error;
pub mod models;
pub mod registry;
pub mod simulator;

pub use error::SimulationError;
pub use models::*;
pub use registry::BracketTableRegistry;
pub use simulator::Simulator;
