use serde::Deserialize;

/// Canonical form of a seat label: trimmed and uppercased.
pub fn normalize_seat_label(label: &str) -> String {
    label.trim().to_uppercase()
}

/// Seats as accepted on the wire: either a JSON array or the legacy
/// comma-joined string (`"A1,A2"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SeatList {
    Many(Vec<String>),
    Joined(String),
}

impl SeatList {
    /// Normalised labels with blanks dropped, in input order.
    pub fn into_labels(self) -> Vec<String> {
        let raw: Vec<String> = match self {
            SeatList::Many(labels) => labels,
            SeatList::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };
        raw.iter()
            .map(|label| normalize_seat_label(label))
            .filter(|label| !label.is_empty())
            .collect()
    }
}
