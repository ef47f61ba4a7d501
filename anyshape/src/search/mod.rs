//! The search pipeline.
//!
//! ```text
//! combos ──► Dispatcher ──(bounded work queue)──► WorkerPool ──► scan pool
//!               │                                                  │
//!               └──────────(name matches)──┐      ┌──(content hits)┘
//!                                          ▼      ▼
//!                                  unbounded record stream
//!                                            │
//!                                            ▼
//!                                      DedupWriter ──► output file
//! ```
//!
//! The bounded queue is the only backpressure: when workers fall behind the
//! walk blocks. The record stream is unbounded so producers never wait on the
//! writer. A [`CompletionTracker`] decides when everything that was
//! dispatched has been written, which is when the stream may be closed.
pub mod dispatcher;
pub mod engine;
pub mod limiter;
pub mod scanner;
pub mod tracker;
pub mod worker;
pub mod writer;

pub use dispatcher::Dispatcher;
pub use engine::{run, RunReport};
pub use limiter::ScanLimiter;
pub use tracker::{CompletionTracker, Ticket};
pub use worker::{WorkItem, WorkerPool};
pub use writer::{DedupWriter, WriterStats};
