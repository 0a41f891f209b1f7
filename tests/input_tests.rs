//! Tests for the single-line text input: editing, cursor movement, masking

#[cfg(test)]
mod input_handling {
    use neonchat::input::TextInput;

    #[test]
    fn insert_char_basic() {
        let mut input = TextInput::new();
        input.insert_char('h');
        input.insert_char('i');
        assert_eq!(input.as_str(), "hi");
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn insert_char_unicode() {
        let mut input = TextInput::new();
        input.insert_char('é');
        assert_eq!(input.cursor(), 2); // UTF-8 length
        assert_eq!(input.cursor_column(), 1);
    }

    #[test]
    fn delete_char_unicode() {
        let mut input = TextInput::new();
        input.insert_char('a');
        input.insert_char('é');
        input.delete_char();
        assert_eq!(input.as_str(), "a");
    }

    #[test]
    fn delete_char_noop_when_empty() {
        let mut input = TextInput::new();
        input.delete_char();
        assert!(input.is_empty());
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn insert_and_delete_at_cursor_middle() {
        let mut input = TextInput::new();
        input.set("ac");
        input.move_cursor_left();
        input.insert_char('b');
        assert_eq!(input.as_str(), "abc");
        input.move_cursor_right();
        input.move_cursor_right();
        assert_eq!(input.cursor(), 3);
        input.move_cursor_left();
        input.delete_char();
        assert_eq!(input.as_str(), "ac");
    }

    #[test]
    fn cursor_stops_at_bounds() {
        let mut input = TextInput::new();
        input.set("x");
        input.move_cursor_right();
        assert_eq!(input.cursor(), 1);
        input.move_cursor_left();
        input.move_cursor_left();
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn take_clears_state() {
        let mut input = TextInput::new();
        input.set("test");
        assert_eq!(input.take(), "test");
        assert!(input.is_empty());
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn masked_display_hides_text() {
        let mut input = TextInput::masked();
        input.set("pw!");
        assert_eq!(input.display(), "•••");
        assert_eq!(input.as_str(), "pw!");
        input.clear();
        assert!(input.is_empty());
    }
}
