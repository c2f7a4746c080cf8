//! Type descriptors.
//!
//! A [`CelType`] is a named descriptor carrying the traits its values
//! satisfy. Types compare by name identity; the descriptors for the built-in
//! types are process-wide singletons behind `LazyLock`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

use crate::traits::Traits;

/// A named runtime type.
#[derive(Clone, Debug)]
pub struct CelType {
    name: Arc<str>,
    traits: Traits,
}

impl CelType {
    /// Create a descriptor for a named type with the given traits.
    pub fn new(name: impl AsRef<str>, traits: Traits) -> Self {
        CelType {
            name: Arc::from(name.as_ref()),
            traits,
        }
    }

    /// The type's fully qualified name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full trait mask.
    #[inline]
    pub fn traits(&self) -> Traits {
        self.traits
    }

    /// Whether this type carries every trait in `required`.
    #[inline]
    pub fn has_trait(&self, required: Traits) -> bool {
        self.traits.contains(required)
    }
}

// Types compare by name identity only; traits are derived metadata.

impl PartialEq for CelType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for CelType {}

impl Hash for CelType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for CelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

macro_rules! builtin_type {
    ($static_name:ident, $accessor:ident, $name:literal, $traits:expr) => {
        static $static_name: LazyLock<CelType> = LazyLock::new(|| CelType::new($name, $traits));

        /// Singleton descriptor for the built-in type.
        pub fn $accessor() -> &'static CelType {
            &$static_name
        }
    };
}

builtin_type!(NULL_TYPE, null_type, "null_type", Traits::empty());
builtin_type!(BOOL_TYPE, bool_type, "bool", Traits::COMPARER);
builtin_type!(INT_TYPE, int_type, "int", Traits::INT_ARITH);
builtin_type!(UINT_TYPE, uint_type, "uint", Traits::UINT_ARITH);
builtin_type!(
    DOUBLE_TYPE,
    double_type,
    "double",
    Traits::ADDER
        .union(Traits::SUBTRACTOR)
        .union(Traits::NEGATER)
        .union(Traits::MULTIPLIER)
        .union(Traits::DIVIDER)
        .union(Traits::COMPARER)
);
builtin_type!(
    STRING_TYPE,
    string_type,
    "string",
    Traits::ADDER.union(Traits::COMPARER).union(Traits::SIZER)
);
builtin_type!(
    BYTES_TYPE,
    bytes_type,
    "bytes",
    Traits::ADDER.union(Traits::COMPARER).union(Traits::SIZER)
);
builtin_type!(
    DURATION_TYPE,
    duration_type,
    "duration",
    Traits::ADDER
        .union(Traits::SUBTRACTOR)
        .union(Traits::NEGATER)
        .union(Traits::COMPARER)
        .union(Traits::RECEIVER)
);
builtin_type!(
    TIMESTAMP_TYPE,
    timestamp_type,
    "timestamp",
    Traits::ADDER
        .union(Traits::SUBTRACTOR)
        .union(Traits::COMPARER)
        .union(Traits::RECEIVER)
);
builtin_type!(
    LIST_TYPE,
    list_type,
    "list",
    Traits::ADDER
        .union(Traits::CONTAINER)
        .union(Traits::INDEXER)
        .union(Traits::ITERABLE)
        .union(Traits::SIZER)
);
builtin_type!(
    MAP_TYPE,
    map_type,
    "map",
    Traits::CONTAINER
        .union(Traits::INDEXER)
        .union(Traits::MAPPER)
        .union(Traits::FIELD_TESTER)
        .union(Traits::ITERABLE)
        .union(Traits::SIZER)
);
builtin_type!(
    OPTIONAL_TYPE,
    optional_type,
    "optional_type",
    Traits::RECEIVER
);
builtin_type!(TYPE_TYPE, type_type, "type", Traits::empty());
builtin_type!(UNKNOWN_TYPE, unknown_type, "unknown", Traits::empty());
builtin_type!(ERROR_TYPE, error_type, "error", Traits::empty());

/// Traits given to registered object (struct) types.
pub fn object_traits() -> Traits {
    Traits::INDEXER.union(Traits::FIELD_TESTER)
}
