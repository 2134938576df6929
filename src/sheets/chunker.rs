pub const DEFAULT_MAX_CHARS: usize = 6000;

/// Lazy, non-overlapping slices of at most `max_chars` characters each.
///
/// A clone taken before iteration walks the same chunks again.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    max_chars: usize,
}

pub fn chunk_text(text: &str, max_chars: usize) -> Chunks<'_> {
    Chunks {
        rest: text,
        max_chars: max_chars.max(1),
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let split_at = self
            .rest
            .char_indices()
            .nth(self.max_chars)
            .map(|(offset, _)| offset)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(split_at);
        self.rest = rest;
        Some(chunk)
    }
}
