use crate::model::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateGroup<T> {
    pub key: String,
    pub items: Vec<T>,
}

/// Grouped candidates plus the active pointer.
///
/// Group slots keep the order in which their keys were first registered. An
/// emptied group keeps its slot, so re-installing it later does not move it to
/// the end of the cycle. Either both `active_key` and `active` are set, with
/// `active` a member of that group, or neither is.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState<T> {
    groups: Vec<CandidateGroup<T>>,
    active_key: Option<String>,
    active: Option<T>,
}

impl<T> Default for SelectionState<T> {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            active_key: None,
            active: None,
        }
    }
}

impl<T: Identity + Clone> SelectionState<T> {
    /// State with slots pre-registered in the given order.
    pub fn with_order<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = Self::default();
        for key in keys {
            state.register(key);
        }
        state
    }

    pub fn register(&mut self, key: impl Into<String>) {
        let key = key.into();
        if self.slot(&key).is_none() {
            self.groups.push(CandidateGroup {
                key,
                items: Vec::new(),
            });
        }
    }

    pub fn active(&self) -> Option<&T> {
        self.active.as_ref()
    }

    pub fn active_key(&self) -> Option<&str> {
        self.active_key.as_deref()
    }

    pub fn group(&self, key: &str) -> Option<&[T]> {
        self.slot(key)
            .map(|index| self.groups[index].items.as_slice())
            .filter(|items| !items.is_empty())
    }

    /// Non-empty groups in cycling order.
    pub fn groups(&self) -> impl Iterator<Item = &CandidateGroup<T>> {
        self.groups.iter().filter(|group| !group.items.is_empty())
    }

    pub fn total_len(&self) -> usize {
        self.groups.iter().map(|group| group.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    /// True when the active group offers more than one candidate.
    pub fn has_alternatives(&self) -> bool {
        self.active_key
            .as_deref()
            .and_then(|key| self.group(key))
            .is_some_and(|items| items.len() > 1)
    }

    /// Replaces the contents of group `key`.
    ///
    /// An empty `items` removes the group; if it was active, the first candidate
    /// of the first non-empty group becomes active. A non-empty group becomes
    /// active (first item) when nothing is active or when it already was the
    /// active group.
    pub fn install(&mut self, key: &str, items: Vec<T>) {
        self.register(key);
        let Some(index) = self.slot(key) else {
            return;
        };
        let is_active = self.active_key.as_deref() == Some(key);

        if items.is_empty() {
            self.groups[index].items.clear();
            if is_active {
                self.clear_active();
                self.advance(Direction::Next);
            }
            return;
        }

        let first = items[0].clone();
        self.groups[index].items = items;
        if self.active_key.is_none() || is_active {
            self.active_key = Some(key.to_string());
            self.active = Some(first);
        }
    }

    /// Empties every group and clears the active pointer, keeping slot order.
    pub fn clear(&mut self) {
        for group in &mut self.groups {
            group.items.clear();
        }
        self.clear_active();
    }

    /// Drops slots and selection entirely.
    pub fn reset(&mut self) {
        self.groups.clear();
        self.clear_active();
    }

    /// Item-by-item navigation that rolls over into neighbouring groups.
    pub fn advance(&mut self, direction: Direction) {
        let Some(group_index) = self.active_group_index() else {
            self.select_first();
            return;
        };

        let items = &self.groups[group_index].items;
        let position = self
            .active
            .as_ref()
            .and_then(|active| items.iter().position(|item| item.same_identity(active)));

        let next = position.and_then(|index| match direction {
            Direction::Next if index + 1 < items.len() => Some(index + 1),
            Direction::Previous if index > 0 => Some(index - 1),
            _ => None,
        });

        match next {
            Some(index) => self.active = Some(items[index].clone()),
            None => self.step_group(group_index, direction),
        }
    }

    /// Group-by-group navigation, landing on the boundary item of the
    /// neighbouring group.
    pub fn jump_group(&mut self, direction: Direction) {
        match self.active_group_index() {
            Some(group_index) => self.step_group(group_index, direction),
            None => self.select_first(),
        }
    }

    fn step_group(&mut self, from: usize, direction: Direction) {
        let count = self.groups.len();
        for offset in 1..=count {
            let index = match direction {
                Direction::Next => (from + offset) % count,
                Direction::Previous => (from + count - offset) % count,
            };
            let group = &self.groups[index];
            let target = match direction {
                Direction::Next => group.items.first(),
                Direction::Previous => group.items.last(),
            };
            if let Some(target) = target {
                self.active = Some(target.clone());
                self.active_key = Some(group.key.clone());
                return;
            }
        }
    }

    fn select_first(&mut self) {
        if let Some(group) = self.groups.iter().find(|group| !group.items.is_empty()) {
            self.active = Some(group.items[0].clone());
            self.active_key = Some(group.key.clone());
        }
    }

    fn active_group_index(&self) -> Option<usize> {
        let key = self.active_key.as_deref()?;
        self.slot(key)
            .filter(|index| !self.groups[*index].items.is_empty())
    }

    fn slot(&self, key: &str) -> Option<usize> {
        self.groups.iter().position(|group| group.key == key)
    }

    fn clear_active(&mut self) {
        self.active_key = None;
        self.active = None;
    }
}
