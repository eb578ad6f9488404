//! Core traits that decouple viewgrid from any specific UI shell or
//! transport mechanism.
//!
//! The rendering side (a web view, a native canvas, a test harness, …)
//! implements [`ViewportHost`]; the delivery of user intent implements
//! [`CommandSource`].  The
//! [`WorkspaceController`](crate::workspace::WorkspaceController) only
//! depends on these abstractions.

use crate::command::{Command, ViewportId};
use crate::grid::{GridManager, Removal, ViewportPosition};
use serde::Serialize;
use std::sync::mpsc;

/// Abstraction over whatever actually draws the viewports.
///
/// The host is opaque to the grid: it is told which viewports make up the
/// active tab and how many tabs the tab strip shows, and nothing more.
pub trait ViewportHost {
    /// The error type produced by this host.
    type Error: std::error::Error + Send + 'static;

    /// Render tab `tab_index`, laying out `viewports` in cell order.
    fn show_tab(&self, tab_index: usize, viewports: &[ViewportId]) -> Result<(), Self::Error>;

    /// Update the tab strip to show `tab_count` tabs with `active` selected.
    fn update_tab_strip(&self, tab_count: usize, active: usize) -> Result<(), Self::Error>;

    /// The viewport is no longer part of any tab; its surface may be
    /// released.
    fn release_viewport(&self, id: &ViewportId) -> Result<(), Self::Error>;
}

//  Observers

/// A serialisable copy of the whole layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutSnapshot {
    pub tabs: Vec<Vec<ViewportId>>,
    pub active_tab: usize,
    pub capacity: usize,
}

impl LayoutSnapshot {
    /// Capture the current state of `grid`.
    pub fn of(grid: &GridManager) -> Self {
        Self {
            tabs: grid.groups(),
            active_tab: grid.active_tab(),
            capacity: grid.capacity(),
        }
    }
}

/// Events sent from the
/// [`WorkspaceController`](crate::workspace::WorkspaceController) to any
/// interested observer over an [`mpsc`](std::sync::mpsc) channel.
///
/// Only effective changes are reported; a duplicate add or a stale tab
/// index produces no event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LayoutEvent {
    /// A new viewport was placed.
    Placed {
        id: ViewportId,
        position: ViewportPosition,
    },
    /// A viewport left the grid.
    Removed { id: ViewportId, removal: Removal },
    /// A different tab became active.
    ActiveTabChanged(usize),
    /// All assignments were dropped.
    Reset,
    /// Full layout, sent after a `Sync` or on request.
    Snapshot(LayoutSnapshot),
}

//  Command Source

/// A source of [`Command`]s.
///
/// Implementations listen on some transport (a Unix socket, an in-memory
/// channel, …) and forward parsed commands into the provided
/// [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received command must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Command`] into `sink`.
    ///
    /// This method blocks the calling thread.  To run multiple sources
    /// concurrently, spawn each one on its own thread.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error>;
}
