//! The orchestrator that ties the grid, the viewport host, and command
//! sources together.
//!
//! [`WorkspaceController`] owns the [`GridManager`] and reacts to
//! [`Command`]s by updating the grid and telling the [`ViewportHost`] what
//! to draw.

use crate::command::{Command, TabIndex, ViewportId};
use crate::grid::{GridConfig, GridError, GridManager};
use crate::traits::{LayoutEvent, LayoutSnapshot, ViewportHost};
use log::{debug, info, warn};
use std::sync::mpsc;

/// Possible errors from the controller.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// The viewport host returned an error.
    #[error("viewport host error: {0}")]
    Host(String),
}

/// Drives a [`GridManager`] from viewport lifecycle commands.
///
/// The controller is generic over any [`ViewportHost`], so it has no idea
/// whether viewports end up in a web view or in a test double.
///
/// # Typical usage
///
/// ```ignore
/// let mut ws = WorkspaceController::new(host, GridConfig::default())?;
/// ws.handle(Command::Add("ct-axial".into()))?;
/// ```
pub struct WorkspaceController<H: ViewportHost> {
    host: H,
    grid: GridManager,
    events_tx: Option<mpsc::Sender<LayoutEvent>>,
}

impl<H: ViewportHost> WorkspaceController<H> {
    /// Create a controller with an empty grid of the given shape.
    pub fn new(host: H, config: GridConfig) -> Result<Self, GridError> {
        Ok(Self {
            host,
            grid: GridManager::new(config)?,
            events_tx: None,
        })
    }

    /// Attach a layout event channel.
    ///
    /// Every effective change is reported as a [`LayoutEvent`].  If the
    /// receiver goes away the channel is dropped and the controller keeps
    /// working.
    pub fn set_observer(&mut self, tx: mpsc::Sender<LayoutEvent>) {
        self.events_tx = Some(tx);
    }

    /// Return a shared reference to the underlying grid.
    pub fn grid(&self) -> &GridManager {
        &self.grid
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot::of(&self.grid)
    }

    /// Process a single [`Command`].
    ///
    /// If the host fails, the grid has **already** been updated; the next
    /// successful render brings the host back in line.
    pub fn handle(&mut self, cmd: Command) -> Result<(), WorkspaceError> {
        match cmd {
            Command::Add(id) => {
                if !self.place(id) {
                    return Ok(());
                }
                self.render()
            }
            Command::Remove(id) => {
                let released = match self.evict(&id) {
                    Some(released) => released,
                    None => return Ok(()),
                };
                let rendered = self.render();
                released.and(rendered)
            }
            Command::SetActiveTab(index) => self.set_active_tab(index),
            Command::Reset => {
                info!("reset workspace");
                let released = self.release_all();
                self.grid.reset();
                self.emit(LayoutEvent::Reset);
                let rendered = self.render();
                released.and(rendered)
            }
            Command::Sync(ids) => self.sync(ids),
            Command::Snapshot => {
                debug!("snapshot requested");
                self.emit(LayoutEvent::Snapshot(self.snapshot()));
                self.render()
            }
        }
    }

    /// Reconcile the grid with the UI's viewport registry.
    ///
    /// Viewports already placed keep their cells; new ids are added in
    /// registry order, then ids missing from the registry are removed.
    fn sync(&mut self, ids: Vec<ViewportId>) -> Result<(), WorkspaceError> {
        info!("sync {} viewport(s)", ids.len());
        for id in &ids {
            self.place(id.clone());
        }

        let mut first_err = Ok(());
        let stale: Vec<ViewportId> = self
            .grid
            .groups()
            .into_iter()
            .flatten()
            .filter(|id| !ids.contains(id))
            .collect();
        for id in stale {
            if let Some(Err(e)) = self.evict(&id) {
                if first_err.is_ok() {
                    first_err = Err(e);
                }
            }
        }

        self.emit(LayoutEvent::Snapshot(self.snapshot()));
        let rendered = self.render();
        first_err.and(rendered)
    }

    /// Add `id` to the grid.  Returns `false` if it was already placed.
    fn place(&mut self, id: ViewportId) -> bool {
        if let Some(pos) = self.grid.index_of(&id) {
            debug!(
                "viewport {} already placed at tab {} cell {}",
                id, pos.tab_index, pos.index_in_tab
            );
            return false;
        }
        let position = self.grid.add(id.clone());
        info!(
            "placed {} in tab {} cell {}",
            id, position.tab_index, position.index_in_tab
        );
        self.emit(LayoutEvent::Placed { id, position });
        true
    }

    /// Take `id` out of the grid and release its surface.
    ///
    /// `None` if the id was not placed, otherwise the outcome of the
    /// release.
    fn evict(&mut self, id: &ViewportId) -> Option<Result<(), WorkspaceError>> {
        let active_before = self.grid.active_tab();
        let removal = self.grid.remove(id);
        if removal.is_noop() {
            debug!("viewport {} not in grid, nothing to remove", id);
            return None;
        }
        match removal.tab_removed {
            Some(tab) => info!("removed {} and closed empty tab {}", id, tab),
            None => info!("removed {}", id),
        }

        let released = self.release(id);
        self.emit(LayoutEvent::Removed {
            id: id.clone(),
            removal,
        });
        let active = self.grid.active_tab();
        if removal.tab_removed.is_some() && active != active_before {
            self.emit(LayoutEvent::ActiveTabChanged(active));
        }
        Some(released)
    }

    /// Release every placed viewport, carrying on past failures.
    ///
    /// Returns the first failure.
    fn release_all(&self) -> Result<(), WorkspaceError> {
        let mut first_err = Ok(());
        for id in self.grid.groups().into_iter().flatten() {
            if let Err(e) = self.release(&id) {
                if first_err.is_ok() {
                    first_err = Err(e);
                }
            }
        }
        first_err
    }

    fn release(&self, id: &ViewportId) -> Result<(), WorkspaceError> {
        let released = self
            .host
            .release_viewport(id)
            .map_err(|e| WorkspaceError::Host(e.to_string()));
        if let Err(ref e) = released {
            warn!("release of {} failed (still re-rendering): {}", id, e);
        }
        released
    }

    fn set_active_tab(&mut self, index: TabIndex) -> Result<(), WorkspaceError> {
        let accepted = index
            .to_usize()
            .map(|i| (i, self.grid.active_tab() != i && self.grid.set_active_tab(i)));
        match accepted {
            Some((i, true)) => {
                info!("active tab {}", i);
                self.emit(LayoutEvent::ActiveTabChanged(i));
                self.render()
            }
            Some((i, false)) if i == self.grid.active_tab() => {
                debug!("tab {} already active", i);
                Ok(())
            }
            _ => {
                debug!(
                    "ignoring stale tab index {} ({} tab(s))",
                    index,
                    self.grid.tab_count()
                );
                Ok(())
            }
        }
    }

    /// Push the active tab and the tab strip to the host.
    fn render(&self) -> Result<(), WorkspaceError> {
        let active = self.grid.active_tab();
        self.host
            .show_tab(active, &self.grid.active_group())
            .map_err(|e| WorkspaceError::Host(e.to_string()))?;
        self.host
            .update_tab_strip(self.grid.tab_count(), active)
            .map_err(|e| WorkspaceError::Host(e.to_string()))
    }

    fn emit(&mut self, event: LayoutEvent) {
        if let Some(ref tx) = self.events_tx {
            if tx.send(event).is_err() {
                debug!("layout observer gone, detaching");
                self.events_tx = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ViewportPosition;
    use std::cell::{Cell, RefCell};

    //  Mock ViewportHost

    #[derive(Debug, Clone, PartialEq)]
    enum HostCall {
        Show(usize, Vec<ViewportId>),
        Strip(usize, usize),
        Release(ViewportId),
    }

    /// A test double that records every call made to it.
    #[derive(Debug, Default)]
    struct MockHost {
        calls: RefCell<Vec<HostCall>>,
        fail: Cell<bool>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("mock host error")]
    struct MockError;

    impl MockHost {
        fn check(&self) -> Result<(), MockError> {
            if self.fail.get() {
                Err(MockError)
            } else {
                Ok(())
            }
        }

        fn take(&self) -> Vec<HostCall> {
            self.calls.borrow_mut().drain(..).collect()
        }
    }

    impl ViewportHost for MockHost {
        type Error = MockError;

        fn show_tab(&self, tab_index: usize, viewports: &[ViewportId]) -> Result<(), MockError> {
            self.calls
                .borrow_mut()
                .push(HostCall::Show(tab_index, viewports.to_vec()));
            self.check()
        }

        fn update_tab_strip(&self, tab_count: usize, active: usize) -> Result<(), MockError> {
            self.calls
                .borrow_mut()
                .push(HostCall::Strip(tab_count, active));
            self.check()
        }

        fn release_viewport(&self, id: &ViewportId) -> Result<(), MockError> {
            self.calls.borrow_mut().push(HostCall::Release(id.clone()));
            self.check()
        }
    }

    fn controller(columns: usize, rows: usize) -> WorkspaceController<MockHost> {
        WorkspaceController::new(MockHost::default(), GridConfig::new(columns, rows).unwrap())
            .unwrap()
    }

    fn vid(s: &str) -> ViewportId {
        ViewportId::from(s)
    }

    #[test]
    fn rejects_zero_sized_grid() {
        let bad = GridConfig { columns: 0, rows: 1 };
        assert!(WorkspaceController::new(MockHost::default(), bad).is_err());
    }

    #[test]
    fn add_renders_active_tab_and_strip() {
        let mut ws = controller(2, 2);
        ws.handle(Command::Add(vid("a"))).unwrap();
        assert_eq!(
            ws.host().take(),
            vec![HostCall::Show(0, vec![vid("a")]), HostCall::Strip(1, 0)]
        );
    }

    #[test]
    fn duplicate_add_does_not_touch_host() {
        let mut ws = controller(2, 2);
        ws.handle(Command::Add(vid("a"))).unwrap();
        ws.host().take();
        ws.handle(Command::Add(vid("a"))).unwrap();
        assert!(ws.host().take().is_empty());
        assert_eq!(ws.grid().len(), 1);
    }

    #[test]
    fn overflow_keeps_showing_active_tab() {
        let mut ws = controller(1, 2);
        for id in ["a", "b", "c"] {
            ws.handle(Command::Add(vid(id))).unwrap();
        }
        let calls = ws.host().take();
        assert_eq!(
            calls.last(),
            Some(&HostCall::Strip(2, 0)),
            "new tab appears but tab 0 stays active"
        );
        assert_eq!(calls[calls.len() - 2], HostCall::Show(0, vec![vid("a"), vid("b")]));
    }

    #[test]
    fn remove_releases_viewport_and_reports_tab_removal() {
        let mut ws = controller(1, 1);
        let (tx, rx) = mpsc::channel();
        ws.set_observer(tx);
        ws.handle(Command::Add(vid("a"))).unwrap();
        ws.handle(Command::Add(vid("b"))).unwrap();
        ws.handle(Command::SetActiveTab(TabIndex(1))).unwrap();
        ws.host().take();

        ws.handle(Command::Remove(vid("b"))).unwrap();
        assert_eq!(
            ws.host().take(),
            vec![
                HostCall::Release(vid("b")),
                HostCall::Show(0, vec![vid("a")]),
                HostCall::Strip(1, 0),
            ]
        );

        let events: Vec<LayoutEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                LayoutEvent::Placed {
                    id: vid("a"),
                    position: ViewportPosition::new(0, 0)
                },
                LayoutEvent::Placed {
                    id: vid("b"),
                    position: ViewportPosition::new(1, 0)
                },
                LayoutEvent::ActiveTabChanged(1),
                LayoutEvent::Removed {
                    id: vid("b"),
                    removal: crate::grid::Removal {
                        removed_from: Some(ViewportPosition::new(1, 0)),
                        tab_removed: Some(1),
                    }
                },
                LayoutEvent::ActiveTabChanged(0),
            ]
        );
    }

    #[test]
    fn remove_unknown_is_silent() {
        let mut ws = controller(2, 2);
        ws.handle(Command::Remove(vid("ghost"))).unwrap();
        assert!(ws.host().take().is_empty());
    }

    #[test]
    fn stale_and_negative_tab_indices_are_ignored() {
        let mut ws = controller(2, 2);
        let (tx, rx) = mpsc::channel();
        ws.set_observer(tx);
        ws.handle(Command::SetActiveTab(TabIndex(-1))).unwrap();
        ws.handle(Command::SetActiveTab(TabIndex(100))).unwrap();
        ws.handle(Command::SetActiveTab(TabIndex(0))).unwrap();
        assert_eq!(ws.grid().active_tab(), 0);
        assert!(ws.host().take().is_empty());
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn reset_clears_layout() {
        let mut ws = controller(1, 1);
        for id in ["a", "b", "c"] {
            ws.handle(Command::Add(vid(id))).unwrap();
        }
        ws.handle(Command::SetActiveTab(TabIndex(2))).unwrap();
        ws.host().take();
        ws.handle(Command::Reset).unwrap();
        assert_eq!(ws.snapshot().tabs, vec![Vec::<ViewportId>::new()]);
        assert_eq!(ws.snapshot().active_tab, 0);
        assert_eq!(
            ws.host().take(),
            vec![
                HostCall::Release(vid("a")),
                HostCall::Release(vid("b")),
                HostCall::Release(vid("c")),
                HostCall::Show(0, vec![]),
                HostCall::Strip(1, 0),
            ]
        );
    }

    #[test]
    fn reset_releases_everything_even_when_host_fails() {
        let mut ws = controller(2, 2);
        ws.handle(Command::Add(vid("a"))).unwrap();
        ws.handle(Command::Add(vid("b"))).unwrap();
        ws.host().take();
        ws.host().fail.set(true);
        assert!(matches!(
            ws.handle(Command::Reset),
            Err(WorkspaceError::Host(_))
        ));
        let calls = ws.host().take();
        assert_eq!(calls[0], HostCall::Release(vid("a")));
        assert_eq!(calls[1], HostCall::Release(vid("b")));
        assert!(ws.grid().is_empty());
    }

    #[test]
    fn sync_keeps_existing_placements_and_active_tab() {
        let mut ws = controller(1, 1);
        for id in ["a", "b", "c"] {
            ws.handle(Command::Add(vid(id))).unwrap();
        }
        ws.handle(Command::SetActiveTab(TabIndex(2))).unwrap();
        ws.host().take();
        let (tx, rx) = mpsc::channel();
        ws.set_observer(tx);

        ws.handle(Command::Sync(vec![vid("c"), vid("a")])).unwrap();

        let snap = ws.snapshot();
        assert_eq!(snap.tabs, vec![vec![vid("a")], vec![vid("c")]]);
        assert_eq!(snap.active_tab, 1, "tab holding c stays selected");
        assert_eq!(
            ws.host().take(),
            vec![
                HostCall::Release(vid("b")),
                HostCall::Show(1, vec![vid("c")]),
                HostCall::Strip(2, 1),
            ]
        );
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![
                LayoutEvent::Removed {
                    id: vid("b"),
                    removal: crate::grid::Removal {
                        removed_from: Some(ViewportPosition::new(1, 0)),
                        tab_removed: Some(1),
                    }
                },
                LayoutEvent::ActiveTabChanged(1),
                LayoutEvent::Snapshot(snap),
            ]
        );
    }

    #[test]
    fn sync_adds_new_ids_before_dropping_stale_ones() {
        let mut ws = controller(2, 1);
        ws.handle(Command::Add(vid("old"))).unwrap();
        ws.handle(Command::Add(vid("keep"))).unwrap();
        ws.host().take();

        ws.handle(Command::Sync(vec![vid("keep"), vid("new"), vid("keep")]))
            .unwrap();

        // "new" overflows into a second tab before "old" frees its cell.
        assert_eq!(
            ws.snapshot().tabs,
            vec![vec![vid("keep")], vec![vid("new")]]
        );
        assert_eq!(ws.host().take()[0], HostCall::Release(vid("old")));
    }

    #[test]
    fn snapshot_command_does_not_mutate() {
        let mut ws = controller(2, 2);
        ws.handle(Command::Add(vid("a"))).unwrap();
        let before = ws.snapshot();
        ws.handle(Command::Snapshot).unwrap();
        assert_eq!(ws.snapshot(), before);
    }

    #[test]
    fn host_failure_is_reported_after_grid_update() {
        let mut ws = controller(2, 2);
        ws.host().fail.set(true);
        let err = ws.handle(Command::Add(vid("a"))).unwrap_err();
        assert!(matches!(err, WorkspaceError::Host(_)));
        assert!(ws.grid().contains(&vid("a")));
    }

    #[test]
    fn failed_release_still_rerenders() {
        let mut ws = controller(2, 2);
        ws.handle(Command::Add(vid("a"))).unwrap();
        ws.handle(Command::Add(vid("b"))).unwrap();
        ws.host().take();
        ws.host().fail.set(true);
        assert!(ws.handle(Command::Remove(vid("a"))).is_err());
        // Release fails, then the render stops at the first failing call.
        assert_eq!(
            ws.host().take(),
            vec![HostCall::Release(vid("a")), HostCall::Show(0, vec![vid("b")])]
        );
        assert!(!ws.grid().contains(&vid("a")));
    }

    #[test]
    fn dropped_observer_is_detached() {
        let mut ws = controller(2, 2);
        let (tx, rx) = mpsc::channel();
        ws.set_observer(tx);
        drop(rx);
        ws.handle(Command::Add(vid("a"))).unwrap();
        ws.handle(Command::Add(vid("b"))).unwrap();
        assert_eq!(ws.grid().len(), 2);
    }
}
