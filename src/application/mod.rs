//! Application layer containing the core business logic orchestration.
//!
//! `PaymentPipeline` is the primary entry point for creating, fetching and
//! refunding payments; `SettlementScheduler` runs the delayed settlement
//! simulation on a bounded tokio worker pool.

pub mod pipeline;
pub mod scheduler;
