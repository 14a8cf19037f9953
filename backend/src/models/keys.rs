//! Identifier keys for hierarchy nodes.
//!
//! Feeds deliver ring, group and class identifiers as either numbers or
//! strings. They are kept as the operator wrote them (numbers rendered in
//! their shortest form) so nothing supplied upstream is discarded.

use std::cmp::Ordering;

use crate::define_key_type;

define_key_type!(RingKey);
define_key_type!(GroupKey);
define_key_type!(ClassKey);

impl RingKey {
    /// Ring ordering: numeric identifiers compare numerically and sort before
    /// non-numeric ones, which compare lexicographically.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.total_cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_rings_sort_numerically() {
        let mut rings: Vec<RingKey> = ["10", "2", "1"].iter().map(|s| RingKey::from(*s)).collect();
        rings.sort_by(|a, b| a.display_cmp(b));
        let ids: Vec<&str> = rings.iter().map(|r| r.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "10"]);
    }

    #[test]
    fn test_named_rings_follow_numeric_rings() {
        let mut rings: Vec<RingKey> = ["Jumper", "3", "Derby", "1"]
            .iter()
            .map(|s| RingKey::from(*s))
            .collect();
        rings.sort_by(|a, b| a.display_cmp(b));
        let ids: Vec<&str> = rings.iter().map(|r| r.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "Derby", "Jumper"]);
    }

    #[test]
    fn test_key_display_and_conversion() {
        let key = ClassKey::new("1234");
        assert_eq!(key.to_string(), "1234");
        assert_eq!(key.as_number(), Some(1234.0));
        let raw: String = key.into();
        assert_eq!(raw, "1234");
    }
}
