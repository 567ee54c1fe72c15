//! Search input state machine.
//!
//! The query bar has two states:
//! - **Inactive**: No input in progress. `/` transitions to Input.
//! - **Input**: User is typing a query. `Enter` confirms, `Esc` cancels,
//!   `Up`/`Down` step through recent searches.
//!
//! Confirming yields the query to submit; the viewer controller owns the
//! active query itself.

// ---------------------------------------------------------------------------
// Search mode enum
// ---------------------------------------------------------------------------

/// The current state of the query bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// No input in progress.
    #[default]
    Inactive,
    /// User is typing a query in the input bar.
    Input,
}

/// What confirming the input bar produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchSubmit {
    /// Search for this query.
    Query(String),
    /// The bar was confirmed empty: clear the active query.
    Clear,
}

// ---------------------------------------------------------------------------
// Search state
// ---------------------------------------------------------------------------

/// Query bar state, owned by `App`.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    /// Current mode.
    pub mode: SearchMode,
    /// The input buffer while the user is typing.
    pub input_buffer: String,
    /// Position in the recent-search list while browsing with Up/Down.
    history_cursor: Option<usize>,
}

impl SearchState {
    /// Transition to Input mode, pre-filled with the current query so it
    /// can be edited.
    pub fn start_input(&mut self, current_query: &str) {
        self.mode = SearchMode::Input;
        self.input_buffer = current_query.to_string();
        self.history_cursor = None;
    }

    /// Append a character to the input buffer (Input mode only).
    pub fn on_char(&mut self, ch: char) {
        if self.mode == SearchMode::Input {
            self.input_buffer.push(ch);
            self.history_cursor = None;
        }
    }

    /// Remove the last character from the input buffer (Input mode only).
    pub fn on_backspace(&mut self) {
        if self.mode == SearchMode::Input {
            self.input_buffer.pop();
            self.history_cursor = None;
        }
    }

    /// Step to the next older recent search (Up).
    pub fn history_older(&mut self, recent: &[String]) {
        if self.mode != SearchMode::Input || recent.is_empty() {
            return;
        }
        let next = match self.history_cursor {
            Some(idx) => (idx + 1).min(recent.len() - 1),
            None => 0,
        };
        self.history_cursor = Some(next);
        self.input_buffer = recent[next].clone();
    }

    /// Step back toward the newest recent search (Down). Past the newest,
    /// the buffer is cleared.
    pub fn history_newer(&mut self, recent: &[String]) {
        if self.mode != SearchMode::Input {
            return;
        }
        match self.history_cursor {
            Some(0) | None => {
                self.history_cursor = None;
                self.input_buffer.clear();
            }
            Some(idx) => {
                let prev = (idx - 1).min(recent.len().saturating_sub(1));
                self.history_cursor = Some(prev);
                if let Some(q) = recent.get(prev) {
                    self.input_buffer = q.clone();
                }
            }
        }
    }

    /// Confirm the input (Enter in Input mode).
    ///
    /// Returns `None` outside Input mode.
    pub fn confirm(&mut self) -> Option<SearchSubmit> {
        if self.mode != SearchMode::Input {
            return None;
        }
        let query = self.input_buffer.trim().to_string();
        self.mode = SearchMode::Inactive;
        self.input_buffer.clear();
        self.history_cursor = None;
        if query.is_empty() {
            Some(SearchSubmit::Clear)
        } else {
            Some(SearchSubmit::Query(query))
        }
    }

    /// Cancel the input (Escape key), discarding the buffer.
    pub fn cancel(&mut self) {
        self.mode = SearchMode::Inactive;
        self.input_buffer.clear();
        self.history_cursor = None;
    }

    /// Returns `true` if the user is typing a query.
    pub fn is_input(&self) -> bool {
        self.mode == SearchMode::Input
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn recent() -> Vec<String> {
        vec!["newest".to_string(), "middle".to_string(), "oldest".to_string()]
    }

    // -- State transitions ---------------------------------------------------

    #[test]
    fn test_default_state_is_inactive() {
        let state = SearchState::default();
        assert_eq!(state.mode, SearchMode::Inactive);
        assert!(state.input_buffer.is_empty());
        assert!(!state.is_input());
    }

    #[test]
    fn test_start_input_prefills_current_query() {
        let mut state = SearchState::default();
        state.start_input("cat");
        assert!(state.is_input());
        assert_eq!(state.input_buffer, "cat");
    }

    #[test]
    fn test_on_char_and_backspace() {
        let mut state = SearchState::default();
        state.start_input("");
        state.on_char('a');
        state.on_char('b');
        assert_eq!(state.input_buffer, "ab");
        state.on_backspace();
        assert_eq!(state.input_buffer, "a");
        state.on_backspace();
        state.on_backspace();
        assert!(state.input_buffer.is_empty());
    }

    #[test]
    fn test_on_char_noop_when_not_input_mode() {
        let mut state = SearchState::default();
        state.on_char('a');
        state.on_backspace();
        assert!(state.input_buffer.is_empty());
    }

    #[test]
    fn test_confirm_with_input_submits_trimmed_query() {
        let mut state = SearchState::default();
        state.start_input("");
        for ch in "  cat dog ".chars() {
            state.on_char(ch);
        }
        assert_eq!(
            state.confirm(),
            Some(SearchSubmit::Query("cat dog".to_string()))
        );
        assert_eq!(state.mode, SearchMode::Inactive);
        assert!(state.input_buffer.is_empty());
    }

    #[test]
    fn test_confirm_empty_input_clears() {
        let mut state = SearchState::default();
        state.start_input("   ");
        assert_eq!(state.confirm(), Some(SearchSubmit::Clear));
    }

    #[test]
    fn test_confirm_noop_when_not_input_mode() {
        let mut state = SearchState::default();
        assert_eq!(state.confirm(), None);
    }

    #[test]
    fn test_cancel_discards_input() {
        let mut state = SearchState::default();
        state.start_input("cat");
        state.cancel();
        assert_eq!(state.mode, SearchMode::Inactive);
        assert!(state.input_buffer.is_empty());
    }

    // -- History -------------------------------------------------------------

    #[test]
    fn test_history_older_walks_and_stops_at_oldest() {
        let mut state = SearchState::default();
        state.start_input("");
        let recent = recent();
        state.history_older(&recent);
        assert_eq!(state.input_buffer, "newest");
        state.history_older(&recent);
        state.history_older(&recent);
        state.history_older(&recent);
        assert_eq!(state.input_buffer, "oldest");
    }

    #[test]
    fn test_history_newer_returns_to_empty() {
        let mut state = SearchState::default();
        state.start_input("");
        let recent = recent();
        state.history_older(&recent);
        state.history_older(&recent);
        state.history_newer(&recent);
        assert_eq!(state.input_buffer, "newest");
        state.history_newer(&recent);
        assert!(state.input_buffer.is_empty());
    }

    #[test]
    fn test_typing_resets_history_cursor() {
        let mut state = SearchState::default();
        state.start_input("");
        let recent = recent();
        state.history_older(&recent);
        state.history_older(&recent);
        state.on_char('!');
        state.history_older(&recent);
        assert_eq!(state.input_buffer, "newest");
    }

    #[test]
    fn test_history_noop_with_empty_list() {
        let mut state = SearchState::default();
        state.start_input("x");
        state.history_older(&[]);
        assert_eq!(state.input_buffer, "x");
    }
}
