//! Splitting of oversized messages into platform-safe chunks.
//!
//! Messages are walked one newline-delimited line at a time, and each line is
//! cut into pieces of at most `max_len` characters. Lengths are counted in
//! Unicode scalar values, so a cut never splits a character.

/// One piece of a split message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub text: &'a str,
    /// The piece ends a line that was followed by `'\n'` in the message.
    pub line_end: bool,
}

/// Iterator over the chunks of a message. See [`chunks`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    message: &'a str,
    pos: usize,
    max_len: usize,
}

/// Split `message` into chunks of at most `max_len` characters.
///
/// Every line yields at least one chunk, so blank lines come out as empty
/// chunks. Joining the chunk texts and re-inserting `'\n'` after each chunk
/// with `line_end` set gives back the original message.
///
/// ```
/// use core_logtree::chunk::chunks;
///
/// let parts: Vec<&str> = chunks("abcde\nfg", 2).map(|c| c.text).collect();
/// assert_eq!(parts, ["ab", "cd", "e", "fg"]);
/// ```
pub fn chunks(message: &str, max_len: usize) -> Chunks<'_> {
    Chunks {
        message,
        pos: 0,
        max_len: max_len.max(1),
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.message.len() {
            return None;
        }

        let rest = &self.message[self.pos..];
        let newline = rest.find('\n').unwrap_or(rest.len());
        let line = &rest[..newline];

        let end = line
            .char_indices()
            .nth(self.max_len)
            .map(|(i, _)| i)
            .unwrap_or(newline);

        let line_end = end == newline && newline < rest.len();
        let chunk = Chunk {
            text: &rest[..end],
            line_end,
        };

        self.pos += if line_end { end + 1 } else { end };
        Some(chunk)
    }
}
