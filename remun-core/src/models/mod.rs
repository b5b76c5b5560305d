mod bracket_table;
mod marital_status;
mod scenario;
mod simulation_input;

pub use bracket_table::{BracketTable, BracketTableError, IncomeTaxBracket};
pub use marital_status::MaritalStatus;
pub use scenario::{Scenario, SimulationResult};
pub use simulation_input::SimulationInput;
