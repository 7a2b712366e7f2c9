use std::collections::VecDeque;

use super::tokenizer::{Token, TokenStream};

/// Splits each incoming token on runs of characters outside `[A-Za-z0-9]`.
///
/// Tokens made only of such characters are skipped. Their position
/// increments are carried onto the next emitted token, and any carry left at
/// the end of the stream is reported by [`TokenStream::end`], so proximity
/// queries downstream still see the original distances.
pub struct AlphanumericSplitter<S> {
    input: S,
    pending: VecDeque<Token>,
    skipped: u32,
}

impl<S: TokenStream> AlphanumericSplitter<S> {
    pub fn new(input: S) -> Self {
        Self {
            input,
            pending: VecDeque::new(),
            skipped: 0,
        }
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.input
    }
}

fn split_alphanumeric(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
}

impl<S: TokenStream> TokenStream for AlphanumericSplitter<S> {
    fn next_token(&mut self) -> Option<Token> {
        if let Some(token) = self.pending.pop_front() {
            return Some(token);
        }
        while let Some(token) = self.input.next_token() {
            let mut parts = split_alphanumeric(&token.term).peekable();
            if parts.peek().is_none() {
                self.skipped += token.position_increment;
                continue;
            }
            let first_increment = token.position_increment + self.skipped;
            self.skipped = 0;
            for (i, part) in parts.enumerate() {
                let increment = if i == 0 { first_increment } else { 1 };
                self.pending.push_back(Token::with_increment(part, increment));
            }
            return self.pending.pop_front();
        }
        None
    }

    fn end(&mut self) -> u32 {
        let trailing = self.input.end() + self.skipped;
        self.skipped = 0;
        trailing
    }

    fn reset(&mut self) {
        self.input.reset();
        self.pending.clear();
        self.skipped = 0;
    }
}
