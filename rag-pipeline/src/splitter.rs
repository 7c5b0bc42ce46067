//! Boundary-aware text splitter with guaranteed overlap.
//!
//! Lengths are counted in chars (Unicode scalar values). Each chunk ends at
//! the strongest boundary found in the upper half of its window: paragraph
//! break, line break, sentence end, word gap, in that order, else a hard cut.
//! A chunk never ends before `overlap` chars past its first word, so the next
//! chunk can start on a word at least `overlap` chars before the previous end.
//! Neighbours therefore share at least `overlap` chars, unless whitespace fills
//! `size - overlap` or more chars of the earlier chunk's window; that gap is
//! skipped.

use std::ops::Range;

use serde_json::{Map, Value};

use crate::{error::PipelineError, loader::Document};

const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

/// One slice of a document; inherits the document metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub metadata: Map<String, Value>,
}

#[derive(Clone, Copy, Debug)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// # Errors
    /// `PipelineError::Config` unless `0 <= overlap < size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, PipelineError> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(PipelineError::Config(format!(
                "invalid splitter settings: size={chunk_size}, overlap={chunk_overlap}"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn split_documents(&self, docs: &[Document]) -> Vec<Chunk> {
        docs.iter()
            .flat_map(|doc| {
                self.split_text(&doc.text).into_iter().map(|text| Chunk {
                    text,
                    metadata: doc.metadata.clone(),
                })
            })
            .collect()
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        self.spans(&chars)
            .into_iter()
            .map(|r| chars[r].iter().collect())
            .collect()
    }

    /// Char ranges of every chunk, in order. Ranges never start or end on
    /// whitespace and are never empty.
    fn spans(&self, chars: &[char]) -> Vec<Range<usize>> {
        let n = chars.len();
        let mut out = Vec::new();
        let mut start = skip_ws(chars, 0);

        while start < n {
            let hard_end = (start + self.chunk_size).min(n);
            if hard_end == n {
                out.push(start..trim_end(chars, start, n));
                break;
            }
            let end = self.find_end(chars, start, hard_end);
            out.push(start..end);
            start = self.next_start(chars, start, end);
        }
        out
    }

    fn min_len(&self) -> usize {
        (self.chunk_overlap + 1).max(self.chunk_size / 2)
    }

    fn find_end(&self, chars: &[char], start: usize, hard_end: usize) -> usize {
        // leave a non-whitespace char at or before `end - overlap`
        let first_solid = skip_ws(chars, start + 1);
        let min_end = (start + self.min_len()).max(first_solid + self.chunk_overlap);

        for sep in SEPARATORS {
            let sep: Vec<char> = sep.chars().collect();
            let mut b = hard_end;
            while b >= min_end {
                if b - start >= sep.len() && chars[b - sep.len()..b] == sep[..] {
                    let e = trim_end(chars, start, b);
                    if e >= min_end {
                        return e;
                    }
                    // trimmed ends only shrink as `b` moves left
                    break;
                }
                b -= 1;
            }
        }
        trim_end(chars, start, hard_end)
    }

    fn next_start(&self, chars: &[char], start: usize, end: usize) -> usize {
        if end <= start + self.chunk_overlap {
            return skip_ws(chars, end);
        }
        let limit = end - self.chunk_overlap;

        let word_start = (start + 1..=limit)
            .rev()
            .find(|&p| !chars[p].is_whitespace() && chars[p - 1].is_whitespace());
        if let Some(p) = word_start {
            return p;
        }
        (start + 1..=limit)
            .rev()
            .find(|&p| !chars[p].is_whitespace())
            .unwrap_or_else(|| skip_ws(chars, limit))
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

fn skip_ws(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    i
}

fn trim_end(chars: &[char], start: usize, mut end: usize) -> usize {
    while end > start && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    end
}
