//! Fixed-size overlapping word windows.
//!
//! Window `i` starts at word `i * (size - overlap)` and spans `size` words
//! (fewer for the last one). Iteration ends with the first window that
//! reaches the final word, so a text of `L > size` words yields
//! `ceil((L - overlap) / (size - overlap))` windows and `0 < L <= size`
//! yields exactly one.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 500, overlap: 50 }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let config = Self { chunk_size, overlap };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be > 0".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Lazily yields the windows of `text`. Clone the iterator to restart it.
    pub fn windows<'a>(&self, text: &'a str) -> WordWindows<'a> {
        let words: Vec<&'a str> = text.split_whitespace().collect();
        let next_start = if words.is_empty() { None } else { Some(0) };
        WordWindows { words, next_start, size: self.config.chunk_size, step: self.config.step() }
    }

    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        self.windows(&document.text)
            .enumerate()
            .map(|(chunk_index, text)| Chunk { document: document.name.clone(), chunk_index, text })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct WordWindows<'a> {
    words: Vec<&'a str>,
    next_start: Option<usize>,
    size: usize,
    step: usize,
}

impl Iterator for WordWindows<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let start = self.next_start?;
        let end = (start + self.size).min(self.words.len());
        self.next_start = if end >= self.words.len() { None } else { Some(start + self.step) };
        Some(self.words[start..end].join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(ChunkingConfig::new(5, 5).is_err());
        assert!(ChunkingConfig::new(0, 0).is_err());
        assert!(ChunkingConfig::new(5, 0).is_ok());
    }

    #[test]
    fn windows_restart_from_clone() {
        let chunker = Chunker::new(ChunkingConfig::new(3, 1).unwrap()).unwrap();
        let windows = chunker.windows("a b c d e f g");
        let first: Vec<String> = windows.clone().collect();
        let second: Vec<String> = windows.collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["a b c", "c d e", "e f g"]);
    }
}
