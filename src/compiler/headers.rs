//! Runtime capabilities the emitted code depends on

use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;

pub const STRING: &str = "kernel/string";
pub const ARRAY: &str = "kernel/array";
pub const OBJECT: &str = "kernel/object";
pub const OPERATORS: &str = "kernel/operators";
pub const CONCAT: &str = "kernel/concat";
pub const FCALL: &str = "kernel/fcall";

/// Ordered, idempotent set of required runtime headers
#[derive(Debug, Default)]
pub struct HeadersManager {
    headers: IndexSet<String, FxBuildHasher>,
}

impl HeadersManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dependency; repeated registrations are no-ops
    pub fn add(&mut self, header: &str) {
        if !self.headers.contains(header) {
            self.headers.insert(header.to_string());
        }
    }

    pub fn contains(&self, header: &str) -> bool {
        self.headers.contains(header)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.headers.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut headers = HeadersManager::new();
        headers.add(ARRAY);
        headers.add(STRING);
        headers.add(ARRAY);
        assert_eq!(headers.iter().collect::<Vec<_>>(), [ARRAY, STRING]);
    }
}
