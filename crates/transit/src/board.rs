//! The per-stop arrival board: every catalog stop paired with its arrival index.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::arrivals::ArrivalIndex;
use crate::catalog::{Stop, StopCatalog};
use crate::identifiers::StopIdentifier;

#[derive(Clone, Debug, PartialEq)]
pub struct BoardEntry {
    pub stop: Arc<Stop>,
    pub arrivals: ArrivalIndex,
}

/// Arrival indexes for every stop in a catalog, in ascending stop id order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StopBoard {
    entries: BTreeMap<StopIdentifier, BoardEntry>,
}

impl StopBoard {
    /// One empty index per catalog stop.
    pub fn from_catalog(catalog: &StopCatalog) -> Self {
        let entries = catalog
            .iter()
            .map(|stop| {
                (
                    stop.id.clone(),
                    BoardEntry {
                        stop: stop.clone(),
                        arrivals: ArrivalIndex::new(),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// A board for `catalog` that keeps `previous` arrivals for stops present in both.
    pub fn carry_forward(catalog: &StopCatalog, previous: &StopBoard) -> Self {
        let mut board = Self::from_catalog(catalog);
        for (id, entry) in board.entries.iter_mut() {
            if let Some(old) = previous.entries.get(id) {
                entry.arrivals = old.arrivals.clone();
            }
        }
        board
    }

    pub fn get(&self, id: &StopIdentifier) -> Option<&BoardEntry> {
        self.entries.get(id)
    }

    pub fn arrivals_mut(&mut self, id: &StopIdentifier) -> Option<&mut ArrivalIndex> {
        self.entries.get_mut(id).map(|entry| &mut entry.arrivals)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoardEntry> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BoardEntry> {
        self.entries.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total arrivals across all stops
    pub fn arrival_count(&self) -> usize {
        self.entries.values().map(|entry| entry.arrivals.len()).sum()
    }
}
