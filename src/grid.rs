//! Tabbed viewport grid.
//!
//! The [`GridManager`] assigns viewport ids to a list of *tabs*.  Every tab
//! is a page of `columns × rows` cells, so it holds at most
//! [`GridConfig::capacity`] viewports.  When the tab the user is looking at
//! is full, new viewports spill into the last tab, and a fresh tab is
//! appended once that one is full too.
//!
//! Positions are never stored: [`GridManager::index_of`] scans the live tab
//! contents, so removing an earlier viewport can never leave a stale index
//! behind.

use crate::command::ViewportId;
use serde::{Deserialize, Serialize};

/// Error from building a grid with an unusable shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// `columns` or `rows` was zero.
    #[error("grid must have at least one column and one row (got {columns}x{rows})")]
    ZeroDimension { columns: usize, rows: usize },
    /// `columns * rows` does not fit in `usize`.
    #[error("grid capacity {columns}x{rows} overflows")]
    CapacityOverflow { columns: usize, rows: usize },
}

/// Shape of one tab page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub columns: usize,
    pub rows: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 2,
            rows: 2,
        }
    }
}

impl GridConfig {
    /// Build a validated config.
    pub fn new(columns: usize, rows: usize) -> Result<Self, GridError> {
        let config = Self { columns, rows };
        config.validate()?;
        Ok(config)
    }

    /// Check that both dimensions are positive and the capacity fits.
    pub fn validate(&self) -> Result<(), GridError> {
        self.checked_capacity().map(|_| ())
    }

    /// Maximum number of viewports per tab.
    ///
    /// Only meaningful for a validated config; an invalid one yields `0`.
    pub fn capacity(&self) -> usize {
        self.checked_capacity().unwrap_or(0)
    }

    fn checked_capacity(&self) -> Result<usize, GridError> {
        let (columns, rows) = (self.columns, self.rows);
        if columns == 0 || rows == 0 {
            return Err(GridError::ZeroDimension { columns, rows });
        }
        columns
            .checked_mul(rows)
            .ok_or(GridError::CapacityOverflow { columns, rows })
    }
}

/// Location of a viewport: which tab, and which cell within that tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewportPosition {
    pub tab_index: usize,
    pub index_in_tab: usize,
}

impl ViewportPosition {
    pub fn new(tab_index: usize, index_in_tab: usize) -> Self {
        Self {
            tab_index,
            index_in_tab,
        }
    }
}

/// Outcome of [`GridManager::remove`].
///
/// Both fields are `None` when the id was not present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Removal {
    /// Where the viewport was before it was removed.
    pub removed_from: Option<ViewportPosition>,
    /// Index the emptied tab had before it was deleted.
    pub tab_removed: Option<usize>,
}

impl Removal {
    /// Whether the removal changed nothing.
    pub fn is_noop(&self) -> bool {
        self.removed_from.is_none()
    }
}

/// Clamp an active tab index into `0..tab_count`.
///
/// `tab_count` is never zero for a live grid; a zero count clamps to `0`.
pub fn clamp_active(active: usize, tab_count: usize) -> usize {
    active.min(tab_count.saturating_sub(1))
}

/// Capacity-bounded assignment of viewports to tabs.
///
/// There is always at least one tab, possibly empty, and the active tab
/// index always points at an existing tab.
#[derive(Debug, Clone)]
pub struct GridManager {
    config: GridConfig,
    capacity: usize,
    tabs: Vec<Vec<ViewportId>>,
    active: usize,
}

impl GridManager {
    /// Create an empty grid with a single tab.
    pub fn new(config: GridConfig) -> Result<Self, GridError> {
        let capacity = config.checked_capacity()?;
        Ok(Self {
            config,
            capacity,
            tabs: vec![Vec::new()],
            active: 0,
        })
    }

    //  Accessors

    pub fn config(&self) -> GridConfig {
        self.config
    }

    /// Viewports per tab (`columns * rows`).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tabs (always at least one).
    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    /// Total number of viewports across all tabs.
    pub fn len(&self) -> usize {
        self.tabs.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.iter().all(Vec::is_empty)
    }

    pub fn contains(&self, id: &ViewportId) -> bool {
        self.index_of(id).is_some()
    }

    /// Current position of `id`, computed from the live tab contents.
    pub fn index_of(&self, id: &ViewportId) -> Option<ViewportPosition> {
        self.tabs.iter().enumerate().find_map(|(tab_index, tab)| {
            tab.iter()
                .position(|v| v == id)
                .map(|index_in_tab| ViewportPosition::new(tab_index, index_in_tab))
        })
    }

    /// Copy of every tab, in order.
    pub fn groups(&self) -> Vec<Vec<ViewportId>> {
        self.tabs.clone()
    }

    /// Copy of the active tab.
    pub fn active_group(&self) -> Vec<ViewportId> {
        self.tabs[self.active].clone()
    }

    pub fn active_tab(&self) -> usize {
        self.active
    }

    //  Mutation

    /// Select the active tab.
    ///
    /// Out-of-range indices are ignored and `false` is returned; a UI may
    /// ask for a tab that disappeared a moment ago.
    pub fn set_active_tab(&mut self, index: usize) -> bool {
        if index < self.tabs.len() {
            self.active = index;
            true
        } else {
            false
        }
    }

    /// Place `id` and return its position.
    ///
    /// An id that is already present keeps its position.  Otherwise it goes
    /// into the active tab if that has room, then the last tab, then a new
    /// tab appended at the end.
    pub fn add(&mut self, id: ViewportId) -> ViewportPosition {
        if let Some(existing) = self.index_of(&id) {
            return existing;
        }

        let tab_index = self.target_tab();
        let tab = &mut self.tabs[tab_index];
        tab.push(id);
        ViewportPosition::new(tab_index, tab.len() - 1)
    }

    /// Remove `id` if present.
    ///
    /// A tab emptied by the removal is deleted unless it is the only tab.
    /// The active index keeps pointing at the same logical tab when an
    /// earlier tab disappears and is clamped if it fell off the end.
    pub fn remove(&mut self, id: &ViewportId) -> Removal {
        let Some(position) = self.index_of(id) else {
            return Removal::default();
        };

        let tab = &mut self.tabs[position.tab_index];
        tab.remove(position.index_in_tab);

        let mut tab_removed = None;
        if tab.is_empty() && self.tabs.len() > 1 {
            self.tabs.remove(position.tab_index);
            tab_removed = Some(position.tab_index);
            if position.tab_index <= self.active && self.active > 0 {
                self.active -= 1;
            }
            self.active = clamp_active(self.active, self.tabs.len());
        }

        Removal {
            removed_from: Some(position),
            tab_removed,
        }
    }

    /// Drop every assignment and go back to one empty, active tab.
    pub fn reset(&mut self) {
        self.tabs.clear();
        self.tabs.push(Vec::new());
        self.active = 0;
    }

    //  Internal

    /// Tab that the next new viewport should go into, appending one if
    /// every candidate is full.
    fn target_tab(&mut self) -> usize {
        if self.tabs[self.active].len() < self.capacity {
            return self.active;
        }
        let last = self.tabs.len() - 1;
        if self.tabs[last].len() < self.capacity {
            return last;
        }
        self.tabs.push(Vec::new());
        self.tabs.len() - 1
    }
}

//  Tests
