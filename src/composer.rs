//! Staging area for the next user message: draft text plus an optional file.

use std::path::Path;

use crate::backend::OutboundQuery;
use crate::error::IngestError;
use crate::ingest;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Default, Clone)]
pub struct Composer {
    text: String,
    cursor: usize, // in chars
    file_content: String,
    file_name: Option<String>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn file_content(&self) -> &str {
        &self.file_content
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn has_file(&self) -> bool {
        !self.file_content.is_empty()
    }

    /// Replace the draft text and put the cursor at its end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    /// Read `path` through the ingest adapter. On error the current
    /// attachment is left untouched.
    pub async fn attach_file(&mut self, path: &Path, max_bytes: u64) -> Result<(), IngestError> {
        let content = ingest::read_text_file(path, max_bytes).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.attach_text(name, content);
        Ok(())
    }

    pub fn attach_text(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.file_name = Some(name.into());
        self.file_content = content.into();
    }

    pub fn detach_file(&mut self) {
        self.file_name = None;
        self.file_content.clear();
    }

    /// `None` when there is nothing worth sending.
    pub fn build_query(&self, model: &str) -> Option<OutboundQuery> {
        if self.text.trim().is_empty() && self.file_content.trim().is_empty() {
            return None;
        }
        Some(OutboundQuery {
            chat: self.text.clone(),
            file: self.file_content.clone(),
            model: Some(model.to_string()),
            domains: None,
        })
    }

    pub fn reset(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.detach_file();
    }
}
