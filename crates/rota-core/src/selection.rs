//! Availability selection store
//!
//! Holds at most one option per date. Writes are optimistic: the new value
//! is visible immediately and the returned [`PendingEdit`] is later either
//! committed (backend accepted it) or reverted (backend rejected it).

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::calendar::YearMonth;
use crate::options::AvailabilityOption;

/// Value of one cell. `None` means no availability given.
pub type Selection = Option<AvailabilityOption>;

/// Handle for an optimistic write that has not been acknowledged yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingEdit {
    pub date: NaiveDate,
    pub seq: u64,
    pub value: Selection,
}

#[derive(Debug, Clone, Default)]
struct CellEdits {
    /// Last value the backend acknowledged
    committed: Selection,
    /// Unacknowledged writes, oldest first
    in_flight: Vec<(u64, Selection)>,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    entries: BTreeMap<NaiveDate, AvailabilityOption>,
    pending: HashMap<NaiveDate, CellEdits>,
    next_seq: u64,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from acknowledged server data
    pub fn from_server<I>(selections: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, Selection)>,
    {
        let mut store = Self::new();
        store.replace_all(selections);
        store
    }

    pub fn get(&self, date: NaiveDate) -> Selection {
        self.entries.get(&date).copied()
    }

    /// Optimistically set a cell. `None` clears it.
    pub fn set(&mut self, date: NaiveDate, value: Selection) -> PendingEdit {
        let previous = self.get(date);
        self.write(date, value);

        self.next_seq += 1;
        let seq = self.next_seq;
        let cell = self.pending.entry(date).or_insert_with(|| CellEdits {
            committed: previous,
            in_flight: Vec::new(),
        });
        cell.in_flight.push((seq, value));

        PendingEdit { date, seq, value }
    }

    /// Select `option`, or clear the cell if it already holds it
    pub fn toggle(&mut self, date: NaiveDate, option: AvailabilityOption) -> PendingEdit {
        let value = if self.get(date) == Some(option) {
            None
        } else {
            Some(option)
        };
        self.set(date, value)
    }

    /// The backend accepted `edit`. Older writes to the same cell are
    /// superseded by it.
    pub fn commit(&mut self, edit: PendingEdit) {
        let Some(cell) = self.pending.get_mut(&edit.date) else {
            return;
        };
        if !cell.in_flight.iter().any(|(seq, _)| *seq == edit.seq) {
            return;
        }
        cell.committed = edit.value;
        cell.in_flight.retain(|(seq, _)| *seq > edit.seq);
        if cell.in_flight.is_empty() {
            self.pending.remove(&edit.date);
        }
    }

    /// The backend rejected `edit`. The displayed value falls back to the
    /// newest remaining write, or the committed value, unless a newer write
    /// already replaced it. Returns true if the displayed value changed.
    pub fn revert(&mut self, edit: PendingEdit) -> bool {
        let Some(cell) = self.pending.get_mut(&edit.date) else {
            return false;
        };
        let Some(pos) = cell.in_flight.iter().position(|(seq, _)| *seq == edit.seq) else {
            return false;
        };
        let was_latest = pos + 1 == cell.in_flight.len();
        cell.in_flight.remove(pos);

        let restored = cell
            .in_flight
            .last()
            .map(|(_, value)| *value)
            .unwrap_or(cell.committed);
        if cell.in_flight.is_empty() {
            self.pending.remove(&edit.date);
        }

        if was_latest {
            let changed = self.get(edit.date) != restored;
            self.write(edit.date, restored);
            changed
        } else {
            false
        }
    }

    /// Whether a write to `date` is still waiting for the backend
    pub fn is_saving(&self, date: NaiveDate) -> bool {
        self.pending.contains_key(&date)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Discard everything, pending writes included, and load new data
    pub fn replace_all<I>(&mut self, selections: I)
    where
        I: IntoIterator<Item = (NaiveDate, Selection)>,
    {
        self.entries.clear();
        self.pending.clear();
        for (date, value) in selections {
            self.write(date, value);
        }
    }

    /// Load a fresh server snapshot of the data already on screen. Cells
    /// with writes still in flight keep showing their newest write, and the
    /// snapshot becomes the value a rejected write falls back to.
    pub fn merge_server<I>(&mut self, selections: I)
    where
        I: IntoIterator<Item = (NaiveDate, Selection)>,
    {
        let server: BTreeMap<NaiveDate, Selection> = selections.into_iter().collect();
        self.entries.clear();
        for (date, value) in &server {
            self.write(*date, *value);
        }

        let mut overlay = Vec::with_capacity(self.pending.len());
        for (date, cell) in self.pending.iter_mut() {
            cell.committed = server.get(date).copied().flatten();
            if let Some((_, value)) = cell.in_flight.last() {
                overlay.push((*date, *value));
            }
        }
        for (date, value) in overlay {
            self.write(date, value);
        }
    }

    /// Every day of `month` with its current value, cleared days included
    pub fn month_snapshot(&self, month: YearMonth) -> BTreeMap<NaiveDate, Selection> {
        month
            .first_day()
            .iter_days()
            .take_while(|d| *d <= month.last_day())
            .map(|d| (d, self.get(d)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, AvailabilityOption)> + '_ {
        self.entries.iter().map(|(d, o)| (*d, *o))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn write(&mut self, date: NaiveDate, value: Selection) {
        match value {
            Some(option) => {
                self.entries.insert(date, option);
            }
            None => {
                self.entries.remove(&date);
            }
        }
    }
}
