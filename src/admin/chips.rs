//! Text input that turns into chips on Enter (tags, experience skills, hero roles).

use crate::db::models::ChipSet;

#[derive(Debug, Clone, Default)]
pub struct ChipInput {
    pending: String,
}

impl ChipInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.pending = text.into();
    }

    /// Enter: add the trimmed input to `chips` and clear the input.
    /// Blank input is left alone; returns whether a chip was added.
    pub fn commit(&mut self, chips: &mut ChipSet) -> bool {
        if self.pending.trim().is_empty() {
            return false;
        }
        let added = chips.push(&self.pending);
        self.pending.clear();
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_dedupes_and_clears() {
        let mut tags = ChipSet::new();
        let mut input = ChipInput::new();

        input.set("React");
        assert!(input.commit(&mut tags));
        assert_eq!(input.pending(), "");

        input.set(" React ");
        assert!(!input.commit(&mut tags));
        assert_eq!(input.pending(), "");

        assert_eq!(tags.as_slice(), ["React"]);
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut tags = ChipSet::new();
        let mut input = ChipInput::new();
        input.set("   ");
        assert!(!input.commit(&mut tags));
        assert!(tags.is_empty());
        assert_eq!(input.pending(), "   ");
    }
}
