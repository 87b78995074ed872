//! Text chunking for model-sized requests.
//!
//! Splits an unbounded corpus into pieces that each fit a character budget,
//! breaking on whitespace so words are never cut unless a single word is
//! longer than the whole budget.

/// Default chunk budget in characters.
pub const DEFAULT_CHUNK_BUDGET: usize = 1850;

/// Word-boundary chunker with a character budget.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    budget: usize,
}

impl TextChunker {
    /// Create a chunker. A budget of 0 is clamped to 1.
    pub fn new(budget: usize) -> Self {
        Self {
            budget: budget.max(1),
        }
    }

    /// Maximum characters per chunk.
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Split text into chunks of at most `budget` characters.
    ///
    /// Words are re-joined with single spaces. Empty or whitespace-only input
    /// yields exactly one empty chunk.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in text.split_whitespace() {
            let word_len = word.chars().count();

            if word_len > self.budget {
                // Oversized word: flush, then hard-split on char boundaries
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                let chars: Vec<char> = word.chars().collect();
                let mut pieces = chars.chunks(self.budget).peekable();
                while let Some(piece) = pieces.next() {
                    let piece: String = piece.iter().collect();
                    if pieces.peek().is_some() {
                        chunks.push(piece);
                    } else {
                        current_len = piece.chars().count();
                        current = piece;
                    }
                }
                continue;
            }

            if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= self.budget {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                chunks.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = word_len;
            }
        }

        if !current.is_empty() || chunks.is_empty() {
            chunks.push(current);
        }

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_BUDGET)
    }
}
