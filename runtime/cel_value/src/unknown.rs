//! Unknown markers.
//!
//! An unknown is a sentinel tagged with the ids of the expression nodes whose
//! resolution could not complete (typically because a partial activation
//! declared the underlying attribute as known-unknown). Unknowns propagate
//! like errors but take precedence over them in logical operators and in
//! list/map construction.

use std::fmt;

use smallvec::SmallVec;

/// A set of expression ids at which resolution stopped.
///
/// Ids are kept sorted and deduplicated, so the earliest (smallest) id of an
/// unknown is always `ids()[0]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct UnknownSet {
    ids: SmallVec<[i64; 4]>,
}

impl UnknownSet {
    /// Unknown rooted at a single expression id.
    pub fn new(id: i64) -> Self {
        let mut ids = SmallVec::new();
        ids.push(id);
        UnknownSet { ids }
    }

    /// The tagged expression ids, ascending.
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// Whether an id is part of this set.
    pub fn contains(&self, id: i64) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    /// Union of two unknowns.
    #[must_use]
    pub fn merge(&self, other: &UnknownSet) -> UnknownSet {
        let mut ids = self.ids.clone();
        for id in &other.ids {
            if let Err(pos) = ids.binary_search(id) {
                ids.insert(pos, *id);
            }
        }
        UnknownSet { ids }
    }
}

impl fmt::Display for UnknownSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown{:?}", self.ids.as_slice())
    }
}
