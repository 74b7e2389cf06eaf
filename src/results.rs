use crate::model::SearchResult;

/// Input understood by the result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListInput {
    Next,
    Previous,
    Confirm,
    /// Pointer click on the entry at this index
    Click(usize),
}

/// Ordered results with a clamped selection cursor.
#[derive(Debug, Clone, Default)]
pub struct ResultList {
    items: Vec<SearchResult>,
    cursor: usize,
    focused: bool,
}

impl ResultList {
    pub fn items(&self) -> &[SearchResult] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Gaining focus puts the cursor back on the first entry.
    pub fn set_focused(&mut self, focused: bool) {
        if focused && !self.focused {
            self.cursor = 0;
        }
        self.focused = focused;
    }

    /// Swap in a new result list. The cursor always goes back to the top.
    pub fn replace(&mut self, items: Vec<SearchResult>) {
        self.items = items;
        self.cursor = 0;
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    /// Apply one input and return the index it selects, if any.
    ///
    /// Keyboard inputs are ignored unless the list has focus. The returned
    /// index is not range-checked; use [`ResultList::get`] to resolve it.
    pub fn handle(&mut self, input: ListInput) -> Option<usize> {
        match input {
            ListInput::Click(index) => Some(index),
            _ if !self.focused => None,
            ListInput::Next => {
                self.cursor = (self.cursor + 1).min(self.items.len().saturating_sub(1));
                None
            }
            ListInput::Previous => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            ListInput::Confirm => Some(self.cursor),
        }
    }

    pub fn get(&self, index: usize) -> Option<&SearchResult> {
        self.items.get(index)
    }
}
