use crate::chunk::{Chunk, ChunkMetadata};
use crate::{Error, Result};

/// Overlapping window splitter.
///
/// Sizes are counted in chars, so multi-byte text is never cut inside a
/// code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Splitter {
    chunk_size: usize,
    overlap: usize,
}

impl Splitter {
    /// Create a splitter producing chunks of at most `chunk_size` chars where
    /// consecutive chunks share `overlap` chars.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Lazily split `text` into chunks tagged with `source`.
    ///
    /// The returned iterator is cheap to clone; clone it before consuming to
    /// walk the same sequence again.
    #[must_use]
    pub fn split<'a>(&self, text: &'a str, source: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            source,
            chunk_size: self.chunk_size,
            overlap: self.overlap,
            byte_pos: 0,
            char_pos: 0,
            position: 0,
            done: false,
        }
    }
}

/// Iterator over the chunks of one text. See [`Splitter::split`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    source: &'a str,
    chunk_size: usize,
    overlap: usize,
    byte_pos: usize,
    char_pos: usize,
    position: usize,
    done: bool,
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done || self.byte_pos >= self.text.len() {
            return None;
        }

        let rest = &self.text[self.byte_pos..];
        let window_len = rest
            .char_indices()
            .nth(self.chunk_size)
            .map_or(rest.len(), |(i, _)| i);
        let window = &rest[..window_len];

        let cut = if window_len == rest.len() {
            self.done = true;
            window_len
        } else {
            // a chunk must hold more than `overlap` chars or the window stalls
            let floor = window
                .char_indices()
                .nth(self.overlap)
                .map_or(window.len(), |(i, _)| i);
            find_break(window, floor)
        };

        let content = &window[..cut];
        let chars = content.chars().count();

        let chunk = Chunk {
            content: content.to_string(),
            metadata: ChunkMetadata {
                source_id: self.source.to_string(),
                position: self.position,
                start: self.char_pos,
                end: self.char_pos + chars,
            },
        };

        // step back `overlap` chars from the cut for the next window
        let advance = if self.overlap == 0 {
            cut
        } else {
            content
                .char_indices()
                .rev()
                .nth(self.overlap - 1)
                .map_or(cut, |(i, _)| i)
        };
        self.byte_pos += advance;
        self.char_pos += chars.saturating_sub(self.overlap);
        self.position += 1;

        Some(chunk)
    }
}

/// Pick the byte offset to end `window` at. Always greater than `floor`.
fn find_break(window: &str, floor: usize) -> usize {
    paragraph_break(window, floor)
        .or_else(|| sentence_break(window, floor))
        .or_else(|| word_break(window, floor))
        .unwrap_or(window.len())
}

fn paragraph_break(window: &str, floor: usize) -> Option<usize> {
    window
        .rmatch_indices("\n\n")
        .map(|(i, sep)| i + sep.len())
        .next()
        .filter(|&end| end > floor)
}

fn sentence_break(window: &str, floor: usize) -> Option<usize> {
    let mut chars = window.char_indices().rev().peekable();
    while let Some((i, c)) = chars.next() {
        let end = i + c.len_utf8();
        if end <= floor {
            return None;
        }
        if c.is_whitespace() && matches!(chars.peek(), Some((_, '.' | '!' | '?'))) {
            return Some(end);
        }
    }
    None
}

fn word_break(window: &str, floor: usize) -> Option<usize> {
    window
        .char_indices()
        .rev()
        .map(|(i, c)| (i + c.len_utf8(), c))
        .take_while(|&(end, _)| end > floor)
        .find(|(_, c)| c.is_whitespace())
        .map(|(end, _)| end)
}
