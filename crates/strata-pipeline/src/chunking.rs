//! Line-aligned document chunking

use std::io::{self, BufRead};
use std::iter::FusedIterator;

/// Default chunk size threshold (characters)
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Lazily splits a line-oriented source into chunks
///
/// Whole lines (line endings included) are accumulated until their combined
/// length reaches the threshold, then emitted as one chunk. A line is never
/// split, so a chunk may overshoot the threshold by up to one line. The last
/// partial buffer is always emitted. Concatenating every chunk reproduces the
/// input exactly.
///
/// Single pass: reopen the source to iterate again.
pub struct ChunkIterator<R> {
    reader: R,
    threshold: usize,
    done: bool,
}

impl<R: BufRead> ChunkIterator<R> {
    /// Create a chunk iterator over `reader`
    pub fn new(reader: R, threshold: usize) -> Self {
        Self {
            reader,
            threshold,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for ChunkIterator<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buffer = String::new();
        let mut size = 0;

        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    self.done = true;
                    return if buffer.is_empty() { None } else { Some(Ok(buffer)) };
                }
                Ok(_) => {
                    size += line.chars().count();
                    buffer.push_str(&line);
                    if size >= self.threshold {
                        return Some(Ok(buffer));
                    }
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<R: BufRead> FusedIterator for ChunkIterator<R> {}
