use std::collections::VecDeque;

use super::tokenizer::{Token, TokenStream};

/// Passes every token through and adds the concatenation of each adjacent
/// pair at the position of the first token of the pair.
///
/// `red blue green` becomes `red redblue blue bluegreen green`, so
/// "Apache Tomcat" can also match the single term "apachetomcat".
pub struct TokenPairConcatenator<S> {
    input: S,
    previous: Option<String>,
    pending: VecDeque<Token>,
}

impl<S: TokenStream> TokenPairConcatenator<S> {
    pub fn new(input: S) -> Self {
        Self {
            input,
            previous: None,
            pending: VecDeque::new(),
        }
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.input
    }
}

impl<S: TokenStream> TokenStream for TokenPairConcatenator<S> {
    fn next_token(&mut self) -> Option<Token> {
        if let Some(token) = self.pending.pop_front() {
            return Some(token);
        }
        let token = self.input.next_token()?;
        if let Some(previous) = self.previous.take() {
            self.pending
                .push_back(Token::with_increment(format!("{}{}", previous, token.term), 0));
        }
        self.previous = Some(token.term.clone());
        self.pending.push_back(token);
        self.pending.pop_front()
    }

    fn end(&mut self) -> u32 {
        self.input.end()
    }

    fn reset(&mut self) {
        self.input.reset();
        self.previous = None;
        self.pending.clear();
    }
}
