/// String dictionary for normalized tables
///
/// Identifier and categorical columns repeat the same few strings many times
/// (a few dozen region codes, a handful of payment types). The normalizer
/// stores each distinct string once and keeps integer IDs in the columns, so
/// grouping and distinct-counting work on `u32` keys instead of strings.
///
/// # Design
///
/// - Strings are stored once in a `Vec<String>` (index = ID)
/// - A `HashMap<String, StringId>` provides O(1) lookup from string to ID
/// - IDs are assigned in first-seen order, so interning the same sequence of
///   strings always produces the same IDs
/// - The dictionary is append-only; tables never release strings
///
/// # Examples
///
/// ```
/// use shopdash::StringInterner;
///
/// let mut interner = StringInterner::new();
///
/// let sp = interner.intern("SP");
/// let rj = interner.intern("RJ");
/// assert_eq!(interner.intern("SP"), sp);
/// assert_ne!(sp, rj);
///
/// assert_eq!(interner.resolve(sp), Some("SP"));
/// assert_eq!(interner.get("RJ"), Some(rj));
/// ```

use std::collections::HashMap;

/// Interned string ID type
pub type StringId = u32;

/// Append-only string dictionary shared by all columns of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringInterner {
    string_to_id: HashMap<String, StringId>,
    id_to_string: Vec<String>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        StringInterner {
            string_to_id: HashMap::with_capacity(capacity),
            id_to_string: Vec::with_capacity(capacity),
        }
    }

    /// Intern a string, returning its ID.
    /// Returns the existing ID if the string was seen before.
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&id) = self.string_to_id.get(s) {
            return id;
        }

        let id = self.id_to_string.len() as StringId;
        self.id_to_string.push(s.to_string());
        self.string_to_id.insert(s.to_string(), id);
        id
    }

    /// ID of an already interned string, without interning it.
    pub fn get(&self, s: &str) -> Option<StringId> {
        self.string_to_id.get(s).copied()
    }

    pub fn resolve(&self, id: StringId) -> Option<&str> {
        self.id_to_string.get(id as usize).map(String::as_str)
    }

    /// Number of distinct strings.
    pub fn len(&self) -> usize {
        self.id_to_string.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_string.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_first_seen_order() {
        let mut interner = StringInterner::new();
        assert_eq!(interner.intern("credit_card"), 0);
        assert_eq!(interner.intern("boleto"), 1);
        assert_eq!(interner.intern("credit_card"), 0);
        assert_eq!(interner.intern("voucher"), 2);
        assert_eq!(interner.len(), 3);
    }

    #[test]
    fn test_get_does_not_intern() {
        let mut interner = StringInterner::with_capacity(4);
        interner.intern("SP");
        assert_eq!(interner.get("MG"), None);
        assert_eq!(interner.len(), 1);
        assert_eq!(interner.resolve(0), Some("SP"));
        assert_eq!(interner.resolve(7), None);
    }

    #[test]
    fn test_equal_sequences_build_equal_dictionaries() {
        let words = ["toys", "books", "toys", "garden"];
        let mut a = StringInterner::new();
        let mut b = StringInterner::new();
        for w in words {
            a.intern(w);
            b.intern(w);
        }
        assert_eq!(a, b);
    }
}
