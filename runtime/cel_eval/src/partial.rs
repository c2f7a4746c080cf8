//! Attribute patterns for partial activations.
//!
//! A partial activation declares which attribute subtrees are known-unknown.
//! Each pattern is an ordered qualifier sequence, optionally with wildcards,
//! rooted at a variable name; the attribute resolver matches patterns against
//! the fully qualified path it is resolving and produces an unknown tagged
//! with the node id at the matched depth.

use cel_value::Value;

/// One step of an attribute pattern.
#[derive(Clone, Debug, PartialEq)]
pub enum QualifierPattern {
    /// Matches any qualifier.
    Wildcard,
    /// Matches a field name or string key.
    Field(String),
    /// Matches an int key (or a numerically equal uint key).
    Int(i64),
    /// Matches a uint key (or a numerically equal int key).
    Uint(u64),
    /// Matches a bool key.
    Bool(bool),
}

impl QualifierPattern {
    /// Whether this step matches a resolved qualifier value.
    pub fn matches(&self, step: &Value) -> bool {
        match self {
            QualifierPattern::Wildcard => true,
            QualifierPattern::Field(name) => step.as_str() == Some(name),
            QualifierPattern::Int(n) => Value::Int(*n).equal(step),
            QualifierPattern::Uint(n) => Value::Uint(*n).equal(step),
            QualifierPattern::Bool(b) => matches!(step, Value::Bool(v) if v == b),
        }
    }
}

/// A known-unknown attribute subtree: a variable plus qualifier steps.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributePattern {
    variable: String,
    qualifiers: Vec<QualifierPattern>,
}

impl AttributePattern {
    /// Pattern covering the whole variable.
    pub fn new(variable: impl Into<String>) -> Self {
        AttributePattern {
            variable: variable.into(),
            qualifiers: Vec::new(),
        }
    }

    /// Append a field/string-key step.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.qualifiers.push(QualifierPattern::Field(name.into()));
        self
    }

    /// Append an int-key step.
    #[must_use]
    pub fn index(mut self, key: i64) -> Self {
        self.qualifiers.push(QualifierPattern::Int(key));
        self
    }

    /// Append a uint-key step.
    #[must_use]
    pub fn index_uint(mut self, key: u64) -> Self {
        self.qualifiers.push(QualifierPattern::Uint(key));
        self
    }

    /// Append a bool-key step.
    #[must_use]
    pub fn index_bool(mut self, key: bool) -> Self {
        self.qualifiers.push(QualifierPattern::Bool(key));
        self
    }

    /// Append a wildcard step.
    #[must_use]
    pub fn wildcard(mut self) -> Self {
        self.qualifiers.push(QualifierPattern::Wildcard);
        self
    }

    /// The variable the pattern is rooted at.
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// The qualifier steps.
    pub fn qualifiers(&self) -> &[QualifierPattern] {
        &self.qualifiers
    }

    /// Match against a fully qualified attribute path.
    ///
    /// Matching is prefix-tolerant in both directions: a pattern deeper than
    /// the path still matches (reading `a` when `a.b` is unknown yields an
    /// unknown value), and a path deeper than the pattern matches once the
    /// pattern is exhausted. The returned depth counts matched qualifiers:
    /// `0` means the variable itself, `k` means the k-th qualifier resolved
    /// the match.
    pub fn match_depth(&self, variable: &str, path: &[Value]) -> Option<usize> {
        if self.variable != variable {
            return None;
        }
        let depth = self.qualifiers.len().min(path.len());
        for (pattern, step) in self.qualifiers.iter().zip(path.iter()) {
            if !pattern.matches(step) {
                return None;
            }
        }
        Some(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn variable_only_pattern_matches_everything_under_it() {
        let p = AttributePattern::new("a");
        assert_eq!(p.match_depth("a", &[]), Some(0));
        assert_eq!(p.match_depth("a", &[Value::string("b")]), Some(0));
        assert_eq!(p.match_depth("b", &[]), None);
    }

    #[test]
    fn field_steps_must_line_up() {
        let p = AttributePattern::new("a").field("b").index(1);
        assert_eq!(
            p.match_depth("a", &[Value::string("b"), Value::Int(1)]),
            Some(2)
        );
        assert_eq!(p.match_depth("a", &[Value::string("x")]), None);
        // Path shorter than the pattern still matches at the path's depth.
        assert_eq!(p.match_depth("a", &[Value::string("b")]), Some(1));
    }

    #[test]
    fn wildcard_matches_any_step() {
        let p = AttributePattern::new("a").wildcard().field("c");
        assert_eq!(
            p.match_depth("a", &[Value::Int(42), Value::string("c")]),
            Some(2)
        );
        assert_eq!(
            p.match_depth("a", &[Value::Int(42), Value::string("x")]),
            None
        );
    }

    #[test]
    fn numeric_keys_unify() {
        let p = AttributePattern::new("a").index(3);
        assert_eq!(p.match_depth("a", &[Value::Uint(3)]), Some(1));
        assert_eq!(p.match_depth("a", &[Value::Int(4)]), None);
    }
}
