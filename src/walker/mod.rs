//! Concurrent forest walker
//!
//! This module implements the traversal engine: one tokio task per
//! directory, stopping at each working copy, with completion detected by
//! counting live units through the event queue.
//!
//! # Architecture
//!
//! ```text
//!        roots ──► seed Delta(+N)
//!                      │
//!       ┌──────────────┼──────────────┐
//!       │              │              │
//! ┌─────▼─────┐  ┌─────▼─────┐  ┌─────▼─────┐
//! │  unit     │  │  unit     │  │  unit     │   plain dir: +1 per child, spawn
//! │  (dir)    │  │  (repo)   │  │  (dir)    │   working copy: probe, stop
//! └─────┬─────┘  └─────┬─────┘  └─────┬─────┘   every unit: -1 on exit
//!       │              │              │
//!       └──────────────┼──────────────┘
//!                      ▼
//!          ┌──────────────────────────┐
//!          │   WalkEvent queue        │
//!          │  (tokio unbounded mpsc)  │
//!          └────────────┬─────────────┘
//!                       ▼
//!          ┌──────────────────────────┐
//!          │       Aggregator         │
//!          │  live += delta           │
//!          │  list / count results    │
//!          │  stop when live == 0     │
//!          └──────────────────────────┘
//! ```

pub mod aggregator;
pub mod coordinator;
pub mod tracker;

pub use aggregator::{Aggregator, ErrorPolicy, ScanMode, ScanReport};
pub use coordinator::{DirTask, ScanCoordinator};
pub use tracker::{event_channel, EventSender, LiveGuard, RepoStatus, WalkEvent};
