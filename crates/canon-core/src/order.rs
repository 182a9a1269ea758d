use crate::entry::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderingPolicy {
    pub shorthands_first: bool,
}

impl OrderingPolicy {
    pub fn alphabetical() -> Self {
        Self {
            shorthands_first: false,
        }
    }

    /// Canonical order as a permutation: `result[i]` is the index of the original
    /// entry that belongs at position `i`. Keys compare byte-wise.
    pub fn canonical_order(&self, entries: &[Entry<'_>]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..entries.len()).collect();
        if self.shorthands_first {
            order.sort_by(|&a, &b| {
                let (ea, eb) = (&entries[a], &entries[b]);
                (!ea.shorthand, ea.key).cmp(&(!eb.shorthand, eb.key))
            });
        } else {
            order.sort_by(|&a, &b| entries[a].key.cmp(entries[b].key));
        }
        order
    }
}

pub fn is_identity(order: &[usize]) -> bool {
    order.iter().enumerate().all(|(i, &j)| i == j)
}
