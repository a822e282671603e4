//! Core engine: the collect, stats, buy tick loop.

pub mod agent;
pub mod fanout;
pub mod report;

pub use agent::{Agent, AgentSettings, AgentState, TickReport, ToleranceBounds};
pub use fanout::SessionFanOut;
