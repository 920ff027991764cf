use std::collections::HashSet;
use std::hash::Hash;

/// Keeps the first occurrence of every value, preserving relative order.
pub fn dedup_preserving_order<T, I>(values: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::dedup_preserving_order;
    use crate::domain::PhoneRules;

    #[test]
    fn dedup_keeps_first_seen_order() {
        let values = dedup_preserving_order(vec!["b", "a", "b", "c", "a"]);
        assert_eq!(values, vec!["b", "a", "c"]);
    }

    #[test]
    fn dedup_compares_canonical_forms() {
        let rules = PhoneRules::default();
        let numbers = ["0811 111 1111", "+62811 111 1111", "0811 222 2222"]
            .iter()
            .filter_map(|line| rules.normalize(line));
        let unique = dedup_preserving_order(numbers);
        let values: Vec<&str> = unique.iter().map(|number| number.as_str()).collect();
        assert_eq!(values, vec!["+62 8111 111111", "+62 8112 222222"]);
    }

    #[test]
    fn dedup_handles_empty_input() {
        let values: Vec<String> = dedup_preserving_order(Vec::new());
        assert!(values.is_empty());
    }
}
