//! Live-unit accounting
//!
//! Units never touch the live counter directly. Every unit owns a
//! [`LiveGuard`]; creating a guard for a child sends `Delta(+1)` and dropping
//! a guard sends `Delta(-1)`. Because results and deltas share one ordered
//! queue per sender, a unit's result always arrives before its own `-1`, and
//! a child's `+1` always arrives before its parent's `-1`. The consumer can
//! therefore treat `live == 0` as "nothing left anywhere in the forest".

use crate::error::ScanError;
use crate::vcs::VcsKind;
use std::path::PathBuf;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// A working copy with pending changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoStatus {
    /// Working copy root
    pub path: PathBuf,

    /// Kind detected from the marker
    pub kind: VcsKind,

    /// Raw status output, never empty
    pub status: String,
}

/// Message sent from units to the aggregator
#[derive(Debug)]
pub enum WalkEvent {
    /// Change in the number of live units
    Delta(i64),

    /// A unit finished listing a plain directory
    Visited,

    /// A unit probed a working copy
    Probed(VcsKind),

    /// A working copy with pending changes was found
    Dirty(RepoStatus),

    /// A unit failed
    Failed(ScanError),
}

/// Create the event queue shared by all units of one scan
pub fn event_channel() -> (EventSender, UnboundedReceiver<WalkEvent>) {
    let (tx, rx) = unbounded_channel();
    (EventSender { tx }, rx)
}

/// Sending half of the event queue
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: UnboundedSender<WalkEvent>,
}

impl EventSender {
    /// Send an event; a closed queue means the scan is already over
    pub fn send(&self, event: WalkEvent) {
        let _ = self.tx.send(event);
    }

    /// Queue the initial count for `roots` seeded units
    ///
    /// The guards for those units come from [`EventSender::seeded_guard`],
    /// which does not send its own `+1`.
    pub fn seed(&self, roots: usize) {
        self.send(WalkEvent::Delta(roots as i64));
    }

    /// Guard for a unit already accounted for by [`EventSender::seed`]
    pub fn seeded_guard(&self) -> LiveGuard {
        LiveGuard {
            events: self.clone(),
        }
    }

    /// Account for a new unit and return its guard
    pub fn child_guard(&self) -> LiveGuard {
        self.send(WalkEvent::Delta(1));
        self.seeded_guard()
    }
}

/// Ownership of one live unit
///
/// Sends `Delta(-1)` exactly once, when dropped, whichever way the unit
/// finishes.
#[derive(Debug)]
pub struct LiveGuard {
    events: EventSender,
}

impl LiveGuard {
    /// Account for a new child unit and return its guard
    pub fn child(&self) -> LiveGuard {
        self.events.child_guard()
    }

    /// Event queue this guard reports to
    pub fn events(&self) -> &EventSender {
        &self.events
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.events.send(WalkEvent::Delta(-1));
    }
}
