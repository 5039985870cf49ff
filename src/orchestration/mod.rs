//! Multi-agent orchestration: sequencing agents, the daily work branch, and
//! the report/state writers that consume [`types::AgentRunResult`]s.

pub mod branch;
pub mod orchestrator;
pub mod report;
pub mod types;

pub use orchestrator::Orchestrator;
