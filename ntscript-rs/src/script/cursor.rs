//! Positioned character scan with save-points.

/// A character cursor over script source.
///
/// Positions are char indices; [`slice`](Cursor::slice) recovers the original
/// source text between two positions.
#[derive(Debug, Clone)]
pub struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    pub fn new(src: &str) -> Self {
        Cursor {
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Rewind (or advance) to a position previously returned by [`pos`](Self::pos).
    pub fn restore(&mut self, pos: usize) {
        self.pos = pos.min(self.chars.len());
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Look `n` characters ahead of the current one.
    pub fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    /// Consume `ch` if it is the next character.
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Skip whitespace; returns `true` if a non-whitespace character follows.
    pub fn skip_whitespace(&mut self) -> bool {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        !self.is_eof()
    }

    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.chars.len());
        self.chars[start.min(end)..end].iter().collect()
    }

    pub fn remain(&self) -> String {
        self.slice(self.pos, self.chars.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_restore() {
        let mut c = Cursor::new("ab c");
        assert_eq!(c.advance(), Some('a'));
        let mark = c.pos();
        assert_eq!(c.advance(), Some('b'));
        assert!(c.skip_whitespace());
        assert_eq!(c.peek(), Some('c'));
        c.restore(mark);
        assert_eq!(c.remain(), "b c");
    }

    #[test]
    fn eat_and_lookahead() {
        let mut c = Cursor::new("#f(");
        assert!(c.eat('#'));
        assert!(!c.eat('('));
        assert_eq!(c.peek_at(1), Some('('));
        assert_eq!(c.slice(0, 99), "#f(");
    }

    #[test]
    fn multibyte_positions() {
        let mut c = Cursor::new("é$x");
        c.advance();
        assert_eq!(c.peek(), Some('$'));
        assert_eq!(c.slice(0, 1), "é");
    }
}
