use std::collections::{BTreeMap, HashMap};

/// Maps text positions to the fields bound there.
///
/// A position is the character length of the input right after the bound
/// value was appended. Shrinking the text to a length at or below a position
/// undoes that binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionLedger {
    positions: BTreeMap<usize, String>,
    values: HashMap<String, String>,
}

impl PositionLedger {
    pub fn bind(&mut self, position: usize, field: &str, value: &str) {
        self.positions.insert(position, field.to_string());
        self.values.insert(field.to_string(), value.to_string());
    }

    pub fn is_bound(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.values.is_empty()
    }

    pub fn max_position(&self) -> Option<usize> {
        self.positions.keys().next_back().copied()
    }

    /// `(field, value)` pairs in text order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.positions.values().filter_map(|field| {
            self.values
                .get(field)
                .map(|value| (field.as_str(), value.as_str()))
        })
    }

    /// Removes the most recent binding. A position whose field has no value
    /// is dropped as already unbound.
    pub fn unbind_last(&mut self) -> Option<String> {
        let (_, field) = self.positions.pop_last()?;
        self.values.remove(&field).map(|_| field)
    }

    /// Unbinds every binding at or beyond `len`, newest first.
    pub fn unbind_from(&mut self, len: usize) -> Vec<String> {
        let mut unbound = Vec::new();
        while self.max_position().is_some_and(|position| len <= position) {
            if let Some(field) = self.unbind_last() {
                unbound.push(field);
            }
        }
        unbound
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::PositionLedger;

    fn bound() -> PositionLedger {
        let mut ledger = PositionLedger::default();
        ledger.bind(11, "pair", "EUR/USD");
        ledger.bind(15, "amount", "100");
        ledger
    }

    #[test]
    fn tracks_max_position_and_bindings_in_text_order() {
        let ledger = bound();
        assert_eq!(ledger.max_position(), Some(15));
        assert_eq!(
            ledger.bindings().collect::<Vec<_>>(),
            vec![("pair", "EUR/USD"), ("amount", "100")]
        );
        assert!(ledger.is_bound("pair"));
    }

    #[test]
    fn unbinds_newest_first_as_text_shrinks() {
        let mut ledger = bound();
        assert!(ledger.unbind_from(16).is_empty());
        assert_eq!(ledger.unbind_from(15), vec!["amount"]);
        assert_eq!(ledger.max_position(), Some(11));
        assert_eq!(ledger.unbind_from(4), vec!["pair"]);
        assert!(ledger.is_empty());
        assert_eq!(ledger.max_position(), None);
    }

    #[test]
    fn bulk_deletion_unbinds_several_fields() {
        let mut ledger = bound();
        assert_eq!(ledger.unbind_from(0), vec!["amount", "pair"]);
        assert!(ledger.is_empty());
    }

    #[test]
    fn position_without_value_counts_as_unbound() {
        let mut ledger = bound();
        ledger.values.remove("amount");
        assert_eq!(ledger.unbind_last(), None);
        assert_eq!(ledger.unbind_last(), Some("pair".to_string()));
        assert!(ledger.is_empty());
    }
}
