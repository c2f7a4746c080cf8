//! Source positions for diagnostics.

use rustc_hash::FxHashMap;

/// Maps node ids back to character offsets in the original source text.
///
/// The evaluator itself never reads source text; it only threads offsets into
/// error values so the caller can render diagnostics.
#[derive(Clone, Debug, Default)]
pub struct SourceInfo {
    /// One-line description of the source (file name, "<input>", …).
    pub description: String,
    /// Node id → character offset of the node's start.
    positions: FxHashMap<i64, u32>,
}

impl SourceInfo {
    /// Create an empty table with a description.
    pub fn new(description: impl Into<String>) -> Self {
        SourceInfo {
            description: description.into(),
            positions: FxHashMap::default(),
        }
    }

    /// Record the offset for a node id.
    pub fn set_position(&mut self, id: i64, offset: u32) {
        self.positions.insert(id, offset);
    }

    /// Offset for a node id, if recorded.
    pub fn position(&self, id: i64) -> Option<u32> {
        self.positions.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_roundtrip() {
        let mut info = SourceInfo::new("<input>");
        info.set_position(7, 42);
        assert_eq!(info.position(7), Some(42));
        assert_eq!(info.position(8), None);
    }
}
