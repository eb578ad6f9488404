//! **viewgrid** — tabbed viewport layout for an imaging workspace.
//!
//! Viewports are packed into tabs of `columns × rows` cells.  When the tab
//! on screen is full, new viewports overflow into the last tab and then
//! into freshly appended tabs; closing viewports compacts the tab list
//! again while keeping the selected tab stable.
//!
//! # Architecture
//!
//! [`grid::GridManager`] is the pure allocation engine.  Around it:
//!
//! * [`traits::ViewportHost`] — abstracts whatever draws the viewports so
//!   the layout logic is not coupled to any UI toolkit.
//! * [`traits::CommandSource`] — abstracts the transport that delivers
//!   viewport lifecycle events (a Unix socket, a test harness, …).
//! * [`workspace::WorkspaceController`] — applies [`command::Command`]s to
//!   the grid and tells the host what to show.
//!
//! The Unix-socket transport lives in [`ipc`].

pub mod command;
pub mod config;
pub mod grid;
pub mod ipc;
pub mod traits;
pub mod workspace;
