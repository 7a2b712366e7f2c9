/// A term together with its distance from the previous emitted term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    /// `1` for the next position, `0` for the same position as the previous
    /// token, larger when positions were skipped.
    pub position_increment: u32,
}

impl Token {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            position_increment: 1,
        }
    }

    pub fn with_increment(term: impl Into<String>, position_increment: u32) -> Self {
        Self {
            term: term.into(),
            position_increment,
        }
    }
}

/// A pull-based stream of tokens.
///
/// Implementations must be reusable: after [`TokenStream::reset`] the stream
/// behaves as if freshly constructed over its (possibly new) input.
pub trait TokenStream {
    /// Next token, or `None` once the stream is exhausted.
    fn next_token(&mut self) -> Option<Token>;

    /// Called once after exhaustion. Returns the position increment that
    /// trails the final token (positions consumed without emitting a term).
    fn end(&mut self) -> u32 {
        0
    }

    fn reset(&mut self);
}

/// Splits text on Unicode whitespace.
#[derive(Debug, Default)]
pub struct WhitespaceTokenizer {
    terms: Vec<String>,
    pos: usize,
}

impl WhitespaceTokenizer {
    pub fn new(text: &str) -> Self {
        let mut tokenizer = Self::default();
        tokenizer.set_input(text);
        tokenizer
    }

    /// Replace the input and rewind.
    pub fn set_input(&mut self, text: &str) {
        self.terms = text.split_whitespace().map(str::to_string).collect();
        self.pos = 0;
    }
}

impl TokenStream for WhitespaceTokenizer {
    fn next_token(&mut self) -> Option<Token> {
        let term = self.terms.get(self.pos)?.clone();
        self.pos += 1;
        Some(Token::new(term))
    }

    fn reset(&mut self) {
        self.pos = 0;
    }
}

/// Lowercases every term.
pub struct LowerCaseFilter<S> {
    input: S,
}

impl<S: TokenStream> LowerCaseFilter<S> {
    pub fn new(input: S) -> Self {
        Self { input }
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.input
    }
}

impl<S: TokenStream> TokenStream for LowerCaseFilter<S> {
    fn next_token(&mut self) -> Option<Token> {
        let mut token = self.input.next_token()?;
        token.term = token.term.to_lowercase();
        Some(token)
    }

    fn end(&mut self) -> u32 {
        self.input.end()
    }

    fn reset(&mut self) {
        self.input.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::testing::drain;

    #[test]
    fn test_whitespace_tokenizer() {
        let mut t = WhitespaceTokenizer::new("  Apache \tTomcat\n");
        let out = drain(&mut t);
        assert_eq!(
            out,
            vec![("Apache".to_string(), 1), ("Tomcat".to_string(), 1)]
        );
    }

    #[test]
    fn test_reset_replays() {
        let mut t = LowerCaseFilter::new(WhitespaceTokenizer::new("Spring Core"));
        let first = drain(&mut t);
        t.reset();
        assert_eq!(drain(&mut t), first);
        assert_eq!(first[0].0, "spring");
    }
}
