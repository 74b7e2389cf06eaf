//! UI-agnostic state of the search dialog.
//!
//! [`Dialog`] owns the query text, the result list and which of the two has
//! input focus. Hosts translate their native key events into [`Key`] values and
//! render a [`DialogView`]; everything else lives here.

use std::time::Duration;

use crate::model::SearchResult;
use crate::results::{ListInput, ResultList};
use crate::search::SearchUpdate;

/// How long an error notice stays up
pub const ERROR_NOTICE_TIMEOUT: Duration = Duration::from_secs(5);
/// How long a success notice stays up
pub const INFO_NOTICE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Query,
    Results,
}

/// Keys the dialog understands, independent of any terminal or GUI toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Up,
    Down,
    Enter,
    /// Advance focus
    Tab,
    /// Advance focus, modified (backwards)
    BackTab,
    Esc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogEvent {
    Key(Key),
    /// Pointer click on the result at this index
    Click(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Idle,
    QueryChanged,
    Select(SearchResult),
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A dismissable, timed message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub timeout: Duration,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            timeout: INFO_NOTICE_TIMEOUT,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            timeout: ERROR_NOTICE_TIMEOUT,
        }
    }
}

/// Snapshot handed to a host for drawing.
#[derive(Debug, Clone, Copy)]
pub struct DialogView<'a> {
    pub query: &'a str,
    pub focus: Focus,
    pub results: &'a [SearchResult],
    pub cursor: usize,
    pub status: Option<&'a str>,
}

#[derive(Debug, Default)]
pub struct Dialog {
    query: String,
    focus: Focus,
    results: ResultList,
    status: Option<String>,
}

impl Dialog {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn results(&self) -> &ResultList {
        &self.results
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn view(&self) -> DialogView<'_> {
        DialogView {
            query: &self.query,
            focus: self.focus,
            results: self.results.items(),
            cursor: self.results.cursor(),
            status: self.status.as_deref(),
        }
    }

    fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.results.set_focused(focus == Focus::Results);
    }

    /// Apply a search update to the result list.
    pub fn apply(&mut self, update: SearchUpdate) {
        match update {
            SearchUpdate::Results { results, .. } => self.results.replace(results),
            SearchUpdate::Cleared => self.results.clear(),
        }
    }

    pub fn handle(&mut self, event: DialogEvent) -> Outcome {
        match event {
            DialogEvent::Click(index) => self.select(ListInput::Click(index)),
            DialogEvent::Key(Key::Esc) => Outcome::Cancel,
            DialogEvent::Key(Key::Tab) => {
                self.set_focus(Focus::Results);
                Outcome::Idle
            }
            DialogEvent::Key(Key::BackTab) => {
                self.set_focus(Focus::Query);
                Outcome::Idle
            }
            DialogEvent::Key(key) => match self.focus {
                Focus::Query => self.edit_query(key),
                Focus::Results => self.navigate(key),
            },
        }
    }

    fn edit_query(&mut self, key: Key) -> Outcome {
        match key {
            Key::Char(c) => {
                self.query.push(c);
                Outcome::QueryChanged
            }
            Key::Backspace => {
                if self.query.pop().is_some() {
                    Outcome::QueryChanged
                } else {
                    Outcome::Idle
                }
            }
            _ => Outcome::Idle,
        }
    }

    fn navigate(&mut self, key: Key) -> Outcome {
        let input = match key {
            Key::Down | Key::Char('j') => ListInput::Next,
            Key::Up | Key::Char('k') => ListInput::Previous,
            Key::Enter => ListInput::Confirm,
            _ => return Outcome::Idle,
        };
        self.select(input)
    }

    // Out-of-range selections are ignored.
    fn select(&mut self, input: ListInput) -> Outcome {
        self.results
            .handle(input)
            .and_then(|index| self.results.get(index).cloned())
            .map_or(Outcome::Idle, Outcome::Select)
    }
}
