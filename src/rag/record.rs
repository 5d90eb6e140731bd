use serde::{Deserialize, Serialize};

/// What a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Zone overview: available variables and data timeframe.
    ZoneInfo,
    /// Summary statistics for one (variable, column) pair.
    VariableInfo,
}

/// An immutable retrievable unit.
///
/// Records are created once per corpus build, in insertion order, and are
/// never mutated afterwards. Their position in the corpus is the join key
/// into the embedding index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Human-readable sentence(s) describing the zone or variable.
    pub content: String,
    /// Zone tag; absent only for cross-zone overview text.
    pub zone: Option<String>,
    pub kind: RecordKind,
    /// Present only for `VariableInfo` records.
    pub variable: Option<String>,
    /// Underlying data column, present only for `VariableInfo` records.
    pub column: Option<String>,
}

impl Record {
    pub fn zone_info(content: String, zone: String) -> Self {
        Record {
            content,
            zone: Some(zone),
            kind: RecordKind::ZoneInfo,
            variable: None,
            column: None,
        }
    }

    pub fn variable_info(content: String, zone: String, variable: String, column: String) -> Self {
        Record {
            content,
            zone: Some(zone),
            kind: RecordKind::VariableInfo,
            variable: Some(variable),
            column: Some(column),
        }
    }
}
