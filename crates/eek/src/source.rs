use crate::position::{FileId, Position, Span};
use std::collections::HashMap;
use std::sync::Arc;

pub type SourceId = FileId;

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: SourceId,
    pub name: Arc<str>,
    pub text: Arc<str>,
    line_starts: Arc<Vec<usize>>,
}

impl SourceFile {
    pub fn new(id: SourceId, name: impl Into<Arc<str>>, text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let mut line_starts = Vec::with_capacity(text.len() / 32 + 1);
        line_starts.push(0);
        for (idx, ch) in text.char_indices() {
            if ch == '\n' {
                line_starts.push(idx + 1);
            }
        }
        Self {
            id,
            name: name.into(),
            text,
            line_starts: Arc::new(line_starts),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn position(&self, offset: usize) -> Position {
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_at) => insert_at - 1,
        };
        let line_offset = self.line_starts[line_index];
        Position::new(line_index as u32 + 1, (offset - line_offset) as u32 + 1, offset)
    }

    pub fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.id, self.position(start), self.position(end))
    }

    /// Text of a 1-based line without its terminating newline.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        let index = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(index)?;
        let end = self
            .line_starts
            .get(index + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        self.text.get(start..end).map(|line| line.trim_end_matches('\r'))
    }
}

#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
    files_by_name: HashMap<Arc<str>, SourceId>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(name: impl Into<Arc<str>>, text: impl Into<Arc<str>>) -> Self {
        let mut map = SourceMap::new();
        let id = map.add(name, text);
        debug_assert_eq!(id.raw(), 0);
        map
    }

    pub fn add(&mut self, name: impl Into<Arc<str>>, text: impl Into<Arc<str>>) -> SourceId {
        let name_arc = name.into();
        if let Some(id) = self.files_by_name.get(&name_arc) {
            return *id;
        }
        let id = SourceId::new(self.files.len() as u32);
        let file = SourceFile::new(id, name_arc.clone(), text);
        self.files_by_name.insert(name_arc, id);
        self.files.push(file);
        id
    }

    pub fn get(&self, id: SourceId) -> Option<&SourceFile> {
        self.files.get(id.raw() as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_one_based() {
        let file = SourceFile::new(FileId(0), "t", "ab\ncd\n");
        assert_eq!(file.position(0), Position::new(1, 1, 0));
        assert_eq!(file.position(3), Position::new(2, 1, 3));
        assert_eq!(file.position(4), Position::new(2, 2, 4));
        assert_eq!(file.line_text(2), Some("cd"));
        assert_eq!(file.line_text(9), None);
    }

    #[test]
    fn adding_same_name_twice_returns_first_id() {
        let mut map = SourceMap::new();
        let first = map.add("a", "x");
        let second = map.add("a", "y");
        assert_eq!(first, second);
        assert_eq!(map.get(first).map(|f| f.text.to_string()), Some("x".to_string()));
    }
}
