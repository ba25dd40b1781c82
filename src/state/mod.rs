//! Conversation flow module
//!
//! This module drives multi-step dialogues: scene definitions, the live
//! performance of a flow per conversation, and the manager routing replies.

pub mod context;
pub mod manager;
pub mod performance;
pub mod scene;
pub mod sweeper;

// Re-export commonly used state components
pub use context::{SceneAction, SceneContext};
pub use manager::{PerformOutcome, SceneManager};
pub use performance::{Performance, PerformanceSnapshot, SceneState};
pub use scene::{Scene, SceneHandler};
pub use sweeper::PerformanceSweeper;
