use crate::entity::GraphicId;
use indexmap::IndexSet;

/// Ordered selection set.
///
/// Ordering contract:
/// - Iteration yields graphics in the order they were first selected.
/// - Removing a member keeps the relative order of the others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    members: IndexSet<GraphicId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: GraphicId) -> bool {
        self.members.contains(&id)
    }

    /// Appends `id`. Returns `true` if the set changed.
    pub fn insert(&mut self, id: GraphicId) -> bool {
        self.members.insert(id)
    }

    /// Returns `true` if the set changed.
    pub fn remove(&mut self, id: GraphicId) -> bool {
        self.members.shift_remove(&id)
    }

    /// Single member, if exactly one is selected.
    pub fn only(&self) -> Option<GraphicId> {
        match self.members.len() {
            1 => self.members.first().copied(),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = GraphicId> + '_ {
        self.members.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<GraphicId> {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::SelectionSet;
    use crate::entity::GraphicId;
    use foundation::handles::Handle;

    fn g(raw: u64) -> GraphicId {
        GraphicId(Handle::new(raw))
    }

    #[test]
    fn keeps_insertion_order_not_id_order() {
        let mut s = SelectionSet::new();
        assert!(s.insert(g(7)));
        assert!(s.insert(g(2)));
        assert!(s.insert(g(5)));
        assert!(!s.insert(g(2)));
        assert_eq!(s.to_vec(), vec![g(7), g(2), g(5)]);
    }

    #[test]
    fn remove_preserves_relative_order() {
        let mut s = SelectionSet::new();
        for raw in [3, 1, 4, 1, 5] {
            s.insert(g(raw));
        }
        assert!(s.remove(g(1)));
        assert!(!s.remove(g(1)));
        assert_eq!(s.to_vec(), vec![g(3), g(4), g(5)]);
    }

    #[test]
    fn only_requires_exactly_one() {
        let mut s = SelectionSet::new();
        assert_eq!(s.only(), None);
        s.insert(g(1));
        assert_eq!(s.only(), Some(g(1)));
        s.insert(g(2));
        assert_eq!(s.only(), None);
    }
}
