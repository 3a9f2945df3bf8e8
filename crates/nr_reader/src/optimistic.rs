use nr_core::Interaction;
use serde::Serialize;

/// Restores the value captured before an optimistic change.
#[derive(Debug)]
#[must_use = "an optimistic change must be committed or undone"]
pub struct UndoToken<T> {
    previous: T,
}

/// Local view state that can be changed ahead of the store and rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Optimistic<T: Clone> {
    value: T,
}

impl<T: Clone> Optimistic<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Applies `change` now and returns what is needed to revert it.
    pub fn apply_optimistic<F>(&mut self, change: F) -> UndoToken<T>
    where
        F: FnOnce(&T) -> T,
    {
        let previous = self.value.clone();
        self.value = change(&previous);
        UndoToken { previous }
    }

    pub fn undo(&mut self, token: UndoToken<T>) {
        self.value = token.previous;
    }

    /// Keeps the optimistic value.
    pub fn commit(&mut self, token: UndoToken<T>) {
        drop(token);
    }

    /// Replaces the value with what the store reported.
    pub fn reconcile(&mut self, value: T) {
        self.value = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub count: usize,
}

impl LikeState {
    pub fn from_interaction(interaction: &Interaction, user_id: Option<&str>) -> Self {
        Self {
            liked: user_id.map_or(false, |uid| interaction.is_liked_by(uid)),
            count: interaction.likes_count(),
        }
    }

    pub fn toggled(&self) -> Self {
        if self.liked {
            Self { liked: false, count: self.count.saturating_sub(1) }
        } else {
            Self { liked: true, count: self.count + 1 }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_and_undo() {
        let mut state = Optimistic::new(LikeState { liked: false, count: 4 });

        let token = state.apply_optimistic(LikeState::toggled);
        assert_eq!(*state.get(), LikeState { liked: true, count: 5 });

        state.undo(token);
        assert_eq!(*state.get(), LikeState { liked: false, count: 4 });
    }

    #[test]
    fn test_commit_keeps_value() {
        let mut saved = Optimistic::new(false);
        let token = saved.apply_optimistic(|s| !s);
        saved.commit(token);
        assert!(*saved.get());
    }

    #[test]
    fn test_unlike_never_goes_negative() {
        assert_eq!(LikeState { liked: true, count: 0 }.toggled(), LikeState { liked: false, count: 0 });
    }
}
