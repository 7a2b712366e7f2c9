use super::alphanumeric::AlphanumericSplitter;
use super::pair::TokenPairConcatenator;
use super::tokenizer::{LowerCaseFilter, Token, TokenStream, WhitespaceTokenizer};

type Chain = TokenPairConcatenator<LowerCaseFilter<AlphanumericSplitter<WhitespaceTokenizer>>>;

/// Builds the search terms for an evidence field:
/// whitespace split, alphanumeric split, lowercase, adjacent-pair concatenation.
///
/// One analyzer is reused across many documents; each call resets the chain.
pub struct SearchFieldAnalyzer {
    chain: Chain,
}

impl SearchFieldAnalyzer {
    pub fn new() -> Self {
        let chain = TokenPairConcatenator::new(LowerCaseFilter::new(AlphanumericSplitter::new(
            WhitespaceTokenizer::default(),
        )));
        Self { chain }
    }

    /// Every token with its position increment.
    pub fn tokens(&mut self, text: &str) -> Vec<Token> {
        self.chain.reset();
        self.chain
            .inner_mut()
            .inner_mut()
            .inner_mut()
            .set_input(text);

        let mut out = Vec::new();
        while let Some(token) = self.chain.next_token() {
            out.push(token);
        }
        self.chain.end();
        out
    }

    /// Just the terms, in emission order.
    pub fn terms(&mut self, text: &str) -> Vec<String> {
        self.tokens(text).into_iter().map(|t| t.term).collect()
    }
}

impl Default for SearchFieldAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_terms() {
        let mut analyzer = SearchFieldAnalyzer::new();
        assert_eq!(
            analyzer.terms("Apache Tomcat-Catalina"),
            vec![
                "apache",
                "apachetomcat",
                "tomcat",
                "tomcatcatalina",
                "catalina"
            ]
        );
    }

    #[test]
    fn test_reused_across_documents() {
        let mut analyzer = SearchFieldAnalyzer::new();
        let _ = analyzer.terms("spring framework");
        assert_eq!(analyzer.terms("Struts"), vec!["struts"]);
        assert!(analyzer.terms("--- ***").is_empty());
    }

    #[test]
    fn test_positions_survive_symbol_tokens() {
        let mut analyzer = SearchFieldAnalyzer::new();
        let tokens = analyzer.tokens("bob & cat");
        let increments: Vec<u32> = tokens.iter().map(|t| t.position_increment).collect();
        assert_eq!(tokens[1].term, "bobcat");
        assert_eq!(increments, vec![1, 0, 2]);
    }
}
