//! Container (namespace) resolution.
//!
//! A container is the package-like qualifier prefix attached to the planner.
//! A bare name `x.y.z` planned inside container `a.b` resolves by trying
//! `a.b.x.y.z`, `a.x.y.z`, then `x.y.z`; the first name the activation or
//! type provider answers wins. A leading dot forces an absolute reference.

/// The planner's namespace context.
#[derive(Clone, Debug, Default)]
pub struct Container {
    name: String,
}

impl Container {
    /// Root container (no prefix).
    pub fn root() -> Self {
        Container::default()
    }

    /// Container with a dotted prefix such as `"a.b"`.
    pub fn new(name: impl Into<String>) -> Self {
        Container { name: name.into() }
    }

    /// The container's dotted name; empty at the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Candidate fully qualified names for `name`, most specific first.
    pub fn resolve_candidate_names(&self, name: &str) -> Vec<String> {
        if let Some(absolute) = name.strip_prefix('.') {
            return vec![absolute.to_string()];
        }
        let mut candidates = Vec::new();
        let mut prefix = self.name.as_str();
        while !prefix.is_empty() {
            candidates.push(format!("{prefix}.{name}"));
            prefix = match prefix.rfind('.') {
                Some(idx) => &prefix[..idx],
                None => "",
            };
        }
        candidates.push(name.to_string());
        candidates
    }
}
