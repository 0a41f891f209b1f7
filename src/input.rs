use zeroize::Zeroize;

/// Single-line editable text with a byte cursor kept on char boundaries.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    cursor: usize,
    masked: bool,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// An input whose contents are hidden when drawn and wiped when cleared.
    pub fn masked() -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            masked: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn is_masked(&self) -> bool {
        self.masked
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Column of the cursor in characters, for terminal placement.
    pub fn cursor_column(&self) -> u16 {
        self.value[..self.cursor].chars().count() as u16
    }

    /// What the UI should print for this field.
    pub fn display(&self) -> String {
        if self.masked {
            "•".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.clear();
        self.value = value.into();
        self.cursor = self.value.len();
    }

    pub fn clear(&mut self) {
        if self.masked {
            self.value.zeroize();
        }
        self.value.clear();
        self.cursor = 0;
    }

    pub fn take(&mut self) -> String {
        let value = std::mem::take(&mut self.value);
        self.cursor = 0;
        value
    }

    pub fn insert_char(&mut self, c: char) {
        self.value.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            let prev_len = self.value[..self.cursor]
                .chars()
                .last()
                .map(|c| c.len_utf8())
                .unwrap_or(0);
            self.cursor -= prev_len;
            self.value.remove(self.cursor);
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor > 0 {
            let prev_len = self.value[..self.cursor]
                .chars()
                .last()
                .map(|c| c.len_utf8())
                .unwrap_or(0);
            self.cursor -= prev_len;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.value.len() {
            let next_len = self.value[self.cursor..]
                .chars()
                .next()
                .map(|c| c.len_utf8())
                .unwrap_or(0);
            self.cursor += next_len;
        }
    }
}

impl Drop for TextInput {
    fn drop(&mut self) {
        if self.masked {
            self.value.zeroize();
        }
    }
}
