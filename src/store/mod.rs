//! Shared request-lifecycle stores
//!
//! Cache, token counters, duplicate-submission guard, and the loading queue.
//! All four are owned by one [`Orchestrator`](crate::orchestrator::Orchestrator)
//! instead of living as globals; within one orchestrator they keep the
//! shared-singleton semantics the lifecycle depends on.

pub mod cache;
pub mod guard;
pub mod queue;
pub mod token;

pub use cache::{CacheEntry, ResponseCache};
pub use guard::RepeatGuard;
pub use queue::LoadingQueue;
pub use token::{TokenStore, TOKEN_UNUSED};
