//! # precog-core
//!
//! The coordination runtime for Precog agents.
//!
//! This crate provides:
//! - The three seams (`Agent`, `FundingSource`, `RunJournal`)
//! - The `PhaseScheduler` driving Detect, Predict, Prevent, Optimize and Broadcast
//! - The ROI calculator, funding simulator, and knapsack optimizer used by Optimize
//!
//! ## Usage
//!
//! ```rust,ignore
//! use precog_core::{AgentRegistry, PhaseScheduler, traits::{Agent, NullJournal}};
//! ```

pub mod aggregate;
pub mod dispatch;
pub mod funding;
pub mod optimizer;
pub mod registry;
pub mod roi;
pub mod scheduler;
pub mod traits;

pub use aggregate::PhaseContextAggregator;
pub use funding::FundingSimulator;
pub use optimizer::ResourceAllocationOptimizer;
pub use registry::AgentRegistry;
pub use roi::RoiCalculator;
pub use scheduler::PhaseScheduler;
