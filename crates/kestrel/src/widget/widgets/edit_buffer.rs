//! Single-line text buffer with a cursor and a selection.
//!
//! All positions are grapheme-cluster indices, so a cursor never lands inside
//! a multi-codepoint character. The cursor and the selection index always lie
//! in `0..=len()`; every operation clamps to that range in both directions.

use unicode_segmentation::UnicodeSegmentation;

/// Editable text with a cursor and an optional selection.
///
/// In selection mode the text between the cursor and the selection index is
/// selected, and horizontal movement moves the selection index while the
/// cursor stays put.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    text: String,
    cursor: usize,
    selection: usize,
    selection_mode: bool,
}

impl EditBuffer {
    /// Create a buffer holding `text` with the cursor at the front.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in grapheme clusters.
    pub fn len(&self) -> usize {
        self.text.graphemes(true).count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Cursor position in grapheme clusters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The selection end opposite the cursor.
    pub fn selection_index(&self) -> usize {
        self.selection
    }

    pub fn is_selection_mode(&self) -> bool {
        self.selection_mode
    }

    /// Whether a non-empty range is selected.
    pub fn has_selection(&self) -> bool {
        self.selection_mode && self.selection != self.cursor
    }

    /// Replace the text, keeping the cursor and selection where they still fit.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        let len = self.len();
        self.cursor = self.cursor.min(len);
        self.selection = self.selection.min(len);
    }

    // =========================================================================
    // Cursor Movement
    // =========================================================================

    /// Move left by `n` clusters.
    ///
    /// In selection mode the selection index moves instead; when it meets
    /// the cursor, selection mode ends.
    pub fn move_cursor_left(&mut self, n: usize) {
        if self.selection_mode {
            self.selection = self.selection.saturating_sub(n);
            self.leave_selection_if_collapsed();
        } else {
            self.cursor = self.cursor.saturating_sub(n);
        }
    }

    /// Move right by `n` clusters. See [`EditBuffer::move_cursor_left`].
    pub fn move_cursor_right(&mut self, n: usize) {
        let len = self.len();
        if self.selection_mode {
            self.selection = self.selection.saturating_add(n).min(len);
            self.leave_selection_if_collapsed();
        } else {
            self.cursor = self.cursor.saturating_add(n).min(len);
        }
    }

    pub fn move_cursor_to_front(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_to_back(&mut self) {
        self.cursor = self.len();
    }

    /// Extend the selection to the front. No-op outside selection mode.
    pub fn move_selection_to_front(&mut self) {
        if self.selection_mode {
            self.selection = 0;
        }
    }

    /// Extend the selection to the back. No-op outside selection mode.
    pub fn move_selection_to_back(&mut self) {
        if self.selection_mode {
            self.selection = self.len();
        }
    }

    fn leave_selection_if_collapsed(&mut self) {
        if self.selection == self.cursor {
            self.selection_mode = false;
        }
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Insert `text` at the cursor and move the cursor past it.
    ///
    /// A non-empty selection is replaced.
    pub fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.delete_selection();
        let at = self.byte_offset(self.cursor);
        self.text.insert_str(at, text);
        self.cursor = self.text[..at + text.len()].graphemes(true).count();
        if self.selection_mode {
            self.selection = self.cursor;
        }
    }

    /// Remove up to `n` clusters after the cursor, or before it when `after`
    /// is false. Returns the number of clusters removed.
    pub fn remove_text(&mut self, n: usize, after: bool) -> usize {
        let (start, end) = if after {
            (self.cursor, self.cursor.saturating_add(n).min(self.len()))
        } else {
            (self.cursor.saturating_sub(n), self.cursor)
        };
        let removed = end - start;
        if removed == 0 {
            return 0;
        }
        let range = self.byte_offset(start)..self.byte_offset(end);
        self.text.replace_range(range, "");
        self.cursor = start;
        if self.selection_mode {
            self.selection = self.cursor;
        }
        removed
    }

    /// Delete the selected text and leave selection mode.
    ///
    /// Returns `false` when nothing was selected.
    pub fn delete_selection(&mut self) -> bool {
        if !self.has_selection() {
            return false;
        }
        let (start, end) = (self.selection_start(), self.selection_end());
        let range = self.byte_offset(start)..self.byte_offset(end);
        self.text.replace_range(range, "");
        self.cursor = start;
        self.selection = start;
        self.selection_mode = false;
        true
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Enter or leave selection mode. The selection index starts at the cursor.
    pub fn enable_selection_mode(&mut self, enable: bool) {
        if self.selection_mode != enable {
            self.selection_mode = enable;
            self.selection = self.cursor;
        }
    }

    /// Select the whole text with the cursor at the front.
    pub fn select_all(&mut self) {
        if self.is_empty() {
            return;
        }
        self.enable_selection_mode(true);
        self.cursor = 0;
        self.selection = self.len();
    }

    pub fn selection_start(&self) -> usize {
        self.selection.min(self.cursor)
    }

    pub fn selection_end(&self) -> usize {
        self.selection.max(self.cursor)
    }

    /// The selected text, empty outside selection mode.
    pub fn selected_text(&self) -> &str {
        if !self.selection_mode {
            return "";
        }
        let start = self.selection_start();
        self.text_range(start, self.selection_end() - start)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The text before the cursor.
    pub fn text_to_cursor(&self) -> &str {
        &self.text[..self.byte_offset(self.cursor)]
    }

    /// Up to `n` clusters starting at `pos`. Empty when `pos` is past the end.
    pub fn text_range(&self, pos: usize, n: usize) -> &str {
        let len = self.len();
        if pos > len {
            return "";
        }
        let end = pos.saturating_add(n).min(len);
        &self.text[self.byte_offset(pos)..self.byte_offset(end)]
    }

    /// Byte offset of cluster `index`, or the text length past the end.
    fn byte_offset(&self, index: usize) -> usize {
        self.text
            .grapheme_indices(true)
            .nth(index)
            .map_or(self.text.len(), |(offset, _)| offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_back(text: &str) -> EditBuffer {
        let mut buffer = EditBuffer::new(text);
        buffer.move_cursor_to_back();
        buffer
    }

    #[test]
    fn test_cursor_clamps_symmetrically() {
        let mut buffer = EditBuffer::new("abc");
        buffer.move_cursor_left(5);
        assert_eq!(buffer.cursor(), 0);
        buffer.move_cursor_right(2);
        assert_eq!(buffer.cursor(), 2);
        buffer.move_cursor_right(5);
        assert_eq!(buffer.cursor(), 3);
        buffer.move_cursor_left(1);
        assert_eq!(buffer.cursor(), 2);
    }

    #[test]
    fn test_empty_buffer() {
        let mut buffer = EditBuffer::default();
        buffer.move_cursor_right(1);
        buffer.move_cursor_left(1);
        assert_eq!(buffer.cursor(), 0);
        assert_eq!(buffer.remove_text(1, false), 0);
        assert_eq!(buffer.remove_text(1, true), 0);
        assert_eq!(buffer.text_to_cursor(), "");
        buffer.select_all();
        assert!(!buffer.is_selection_mode());
    }

    #[test]
    fn test_set_text_clamps_indices() {
        let mut buffer = at_back("hello world");
        buffer.set_text("hi");
        assert_eq!(buffer.cursor(), 2);
        buffer.set_text("");
        assert_eq!(buffer.cursor(), 0);
    }

    #[test]
    fn test_add_text_at_cursor() {
        let mut buffer = EditBuffer::new("hello wld");
        buffer.move_cursor_right(7);
        buffer.add_text("or");
        assert_eq!(buffer.text(), "hello world");
        assert_eq!(buffer.cursor(), 9);
        assert_eq!(buffer.text_to_cursor(), "hello wor");
    }

    #[test]
    fn test_graphemes_are_single_positions() {
        let mut buffer = at_back("ae\u{301}🇫🇷");
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.cursor(), 3);

        assert_eq!(buffer.remove_text(1, false), 1);
        assert_eq!(buffer.text(), "ae\u{301}");
        buffer.move_cursor_left(1);
        assert_eq!(buffer.text_to_cursor(), "a");
        assert_eq!(buffer.text_range(1, 1), "e\u{301}");
    }

    #[test]
    fn test_remove_text_before_and_after() {
        let mut buffer = EditBuffer::new("abcdef");
        buffer.move_cursor_right(3);

        assert_eq!(buffer.remove_text(2, false), 2);
        assert_eq!(buffer.text(), "adef");
        assert_eq!(buffer.cursor(), 1);

        assert_eq!(buffer.remove_text(10, true), 3);
        assert_eq!(buffer.text(), "a");
        assert_eq!(buffer.cursor(), 1);

        assert_eq!(buffer.remove_text(5, false), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_selection_moves_and_collapses() {
        let mut buffer = EditBuffer::new("abcd");
        buffer.move_cursor_right(2);
        buffer.enable_selection_mode(true);
        assert_eq!(buffer.selection_index(), 2);

        buffer.move_cursor_right(1);
        assert_eq!(buffer.selected_text(), "c");
        assert_eq!((buffer.selection_start(), buffer.selection_end()), (2, 3));

        buffer.move_cursor_left(1);
        assert!(!buffer.is_selection_mode());
        assert_eq!(buffer.cursor(), 2);
    }

    #[test]
    fn test_selection_to_front_and_back() {
        let mut buffer = EditBuffer::new("abcd");
        buffer.move_selection_to_back();
        assert_eq!(buffer.selection_index(), 0);

        buffer.move_cursor_right(1);
        buffer.enable_selection_mode(true);
        buffer.move_selection_to_back();
        assert_eq!(buffer.selected_text(), "bcd");
        buffer.move_selection_to_front();
        assert_eq!(buffer.selected_text(), "a");
    }

    #[test]
    fn test_select_all_and_delete() {
        let mut buffer = at_back("kestrel");
        buffer.select_all();
        assert_eq!(buffer.cursor(), 0);
        assert_eq!(buffer.selected_text(), "kestrel");

        assert!(buffer.delete_selection());
        assert!(buffer.is_empty());
        assert!(!buffer.is_selection_mode());
        assert!(!buffer.delete_selection());
    }

    #[test]
    fn test_add_text_replaces_selection() {
        let mut buffer = EditBuffer::new("one two");
        buffer.enable_selection_mode(true);
        buffer.move_cursor_right(3);
        buffer.add_text("1");
        assert_eq!(buffer.text(), "1 two");
        assert_eq!(buffer.cursor(), 1);
        assert!(!buffer.is_selection_mode());
    }

    #[test]
    fn test_text_range_bounds() {
        let buffer = EditBuffer::new("abc");
        assert_eq!(buffer.text_range(1, 10), "bc");
        assert_eq!(buffer.text_range(3, 1), "");
        assert_eq!(buffer.text_range(4, 1), "");
        assert_eq!(buffer.text_range(0, 0), "");
    }
}
