//! The decision-and-execution core: edge computation, depth-bounded
//! sizing, risk gating, inventory accounting, circuit breaking, and
//! three-leg execution.

pub mod breaker;
pub mod edge;
pub mod executor;
pub mod ledger;
pub mod risk;
pub mod sizing;

pub use breaker::{CircuitBreaker, CircuitState};
pub use edge::FeeSchedule;
pub use executor::ExecutionCoordinator;
pub use ledger::InventoryLedger;
pub use risk::{GateDecision, GateInput, RiskGate, TradePlan};
