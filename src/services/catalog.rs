//! Static seat maps: every label that can ever be sold for an event,
//! tagged with the zone (price category key) it belongs to.
//!
//! Loaded once at startup from a JSON file:
//!
//! ```json
//! {"events": [{"event_id": "…", "zones": [
//!     {"category": "zone1", "seats": ["VIP1"], "rows": [{"row": "A", "from": 1, "to": 20}]}
//! ]}]}
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::normalize_seat_label;

/// Widest row a catalog may declare.
pub const MAX_ROW_SEATS: u32 = 1_000;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read seat catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed seat catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("seat {label} listed twice for event {event_id}")]
    DuplicateSeat { event_id: Uuid, label: String },

    #[error("row {row} of event {event_id} has an empty range {from}..={to}")]
    EmptyRow {
        event_id: Uuid,
        row: String,
        from: u32,
        to: u32,
    },

    #[error("row {row} of event {event_id} spans {width} seats, more than {max}", max = MAX_ROW_SEATS)]
    RowTooWide {
        event_id: Uuid,
        row: String,
        width: u64,
    },
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    events: Vec<EventSeatsDef>,
}

#[derive(Debug, Deserialize)]
struct EventSeatsDef {
    event_id: Uuid,
    #[serde(default)]
    zones: Vec<ZoneDef>,
}

#[derive(Debug, Deserialize)]
struct ZoneDef {
    category: String,
    #[serde(default)]
    seats: Vec<String>,
    #[serde(default)]
    rows: Vec<RowDef>,
}

#[derive(Debug, Deserialize)]
struct RowDef {
    row: String,
    from: u32,
    to: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatEntry {
    pub label: String,
    pub category: String,
}

#[derive(Debug, Clone, Default)]
struct EventSeatMap {
    seats: Vec<SeatEntry>,
    by_label: HashMap<String, usize>,
}

impl EventSeatMap {
    fn push(&mut self, event_id: Uuid, label: &str, category: &str) -> Result<(), CatalogError> {
        let label = normalize_seat_label(label);
        if self.by_label.contains_key(&label) {
            return Err(CatalogError::DuplicateSeat { event_id, label });
        }
        self.by_label.insert(label.clone(), self.seats.len());
        self.seats.push(SeatEntry {
            label,
            category: category.to_string(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SeatCatalog {
    events: HashMap<Uuid, EventSeatMap>,
}

impl SeatCatalog {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        let mut catalog = SeatCatalog::default();

        for event in file.events {
            let map = catalog.events.entry(event.event_id).or_default();
            for zone in event.zones {
                for label in &zone.seats {
                    map.push(event.event_id, label, &zone.category)?;
                }
                for row in &zone.rows {
                    if row.from > row.to {
                        return Err(CatalogError::EmptyRow {
                            event_id: event.event_id,
                            row: row.row.clone(),
                            from: row.from,
                            to: row.to,
                        });
                    }
                    let width = u64::from(row.to - row.from) + 1;
                    if width > u64::from(MAX_ROW_SEATS) {
                        return Err(CatalogError::RowTooWide {
                            event_id: event.event_id,
                            row: row.row.clone(),
                            width,
                        });
                    }
                    for number in row.from..=row.to {
                        map.push(event.event_id, &format!("{}{}", row.row, number), &zone.category)?;
                    }
                }
            }
        }

        Ok(catalog)
    }

    /// Every sellable seat of the event, in definition order. Empty when the
    /// event has no seat map.
    pub fn seats_for(&self, event_id: Uuid) -> &[SeatEntry] {
        self.events
            .get(&event_id)
            .map(|map| map.seats.as_slice())
            .unwrap_or_default()
    }

    pub fn has_seat_map(&self, event_id: Uuid) -> bool {
        !self.seats_for(event_id).is_empty()
    }

    /// Zone of a seat; the label is matched case-insensitively.
    pub fn category_of(&self, event_id: Uuid, label: &str) -> Option<&str> {
        let map = self.events.get(&event_id)?;
        let index = map.by_label.get(&normalize_seat_label(label))?;
        Some(map.seats[*index].category.as_str())
    }

    pub fn contains(&self, event_id: Uuid, label: &str) -> bool {
        self.category_of(event_id, label).is_some()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT: &str = "6f1c1b1e-8a51-4a0e-9d3c-6f0b1f3a2c10";

    fn catalog() -> SeatCatalog {
        SeatCatalog::from_json(&format!(
            r#"{{"events": [{{"event_id": "{EVENT}", "zones": [
                {{"category": "zone1", "seats": ["a1"], "rows": [{{"row": "B", "from": 1, "to": 3}}]}},
                {{"category": "zone2", "seats": ["A2"]}}
            ]}}]}}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_rows_expand_and_labels_normalise() {
        let catalog = catalog();
        let event_id: Uuid = EVENT.parse().unwrap();
        let labels: Vec<&str> = catalog
            .seats_for(event_id)
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["A1", "B1", "B2", "B3", "A2"]);
        assert_eq!(catalog.category_of(event_id, " b2"), Some("zone1"));
        assert_eq!(catalog.category_of(event_id, "a2"), Some("zone2"));
        assert!(!catalog.contains(event_id, "B4"));
    }

    #[test]
    fn test_unknown_event_has_no_seat_map() {
        let catalog = catalog();
        let other = Uuid::new_v4();
        assert!(catalog.seats_for(other).is_empty());
        assert!(!catalog.has_seat_map(other));
        assert_eq!(catalog.category_of(other, "A1"), None);
    }

    #[test]
    fn test_duplicate_label_is_rejected() {
        let result = SeatCatalog::from_json(&format!(
            r#"{{"events": [{{"event_id": "{EVENT}", "zones": [
                {{"category": "zone1", "seats": ["A1"]}},
                {{"category": "zone2", "rows": [{{"row": "a", "from": 1, "to": 2}}]}}
            ]}}]}}"#
        ));
        assert!(matches!(result, Err(CatalogError::DuplicateSeat { .. })));
    }

    #[test]
    fn test_reversed_row_is_rejected() {
        let result = SeatCatalog::from_json(&format!(
            r#"{{"events": [{{"event_id": "{EVENT}", "zones": [
                {{"category": "zone1", "rows": [{{"row": "C", "from": 5, "to": 1}}]}}
            ]}}]}}"#
        ));
        assert!(matches!(result, Err(CatalogError::EmptyRow { .. })));
    }

    #[test]
    fn test_runaway_row_is_rejected() {
        let result = SeatCatalog::from_json(&format!(
            r#"{{"events": [{{"event_id": "{EVENT}", "zones": [
                {{"category": "zone1", "rows": [{{"row": "Z", "from": 1, "to": 4000000000}}]}}
            ]}}]}}"#
        ));
        assert!(matches!(
            result,
            Err(CatalogError::RowTooWide { width: 4_000_000_000, .. })
        ));

        let widest = SeatCatalog::from_json(&format!(
            r#"{{"events": [{{"event_id": "{EVENT}", "zones": [
                {{"category": "zone1", "rows": [{{"row": "Z", "from": 1, "to": {MAX_ROW_SEATS}}}]}}
            ]}}]}}"#
        ))
        .unwrap();
        let event_id: Uuid = EVENT.parse().unwrap();
        assert_eq!(widest.seats_for(event_id).len(), MAX_ROW_SEATS as usize);
    }
}
