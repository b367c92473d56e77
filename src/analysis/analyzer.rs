//! Built-in analyzers: text → terms with positions and offsets.
//!
//! Each analyzer is a named tantivy `TextAnalyzer` pipeline; this module only
//! resolves names and flattens the token stream into owned [`Token`]s.

use std::fmt;
use std::sync::Arc;

use tantivy::tokenizer::{
    LowerCaser, RawTokenizer, RegexTokenizer, SimpleTokenizer, TextAnalyzer, TokenStream,
    WhitespaceTokenizer,
};

use crate::error::{IndexError, Result};

/// Letter runs, for the `simple` analyzer.
const LETTERS: &str = r"\p{L}+";

/// One term produced by an analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    pub position: u32,
    /// Byte offsets into the analyzed text.
    pub start: usize,
    pub end: usize,
}

/// Tokenization + normalization pipeline. Implementations are stateless and
/// shared across threads.
pub trait Analyzer: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn tokens(&self, text: &str) -> Vec<Token>;
}

/// A named tantivy pipeline.
///
/// `TextAnalyzer::token_stream` needs `&mut self`, so every call runs on a
/// clone and the shared instance is never mutated.
#[derive(Clone)]
pub struct BuiltinAnalyzer {
    name: String,
    inner: TextAnalyzer,
}

impl BuiltinAnalyzer {
    fn new(name: impl Into<String>, inner: TextAnalyzer) -> Self {
        Self { name: name.into(), inner }
    }

    /// Lowercased alphanumeric runs.
    pub fn standard() -> Self {
        Self::new(
            "standard",
            TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser).build(),
        )
    }

    /// Lowercased letter runs.
    pub fn simple() -> Result<Self> {
        let tokenizer = regex_tokenizer("simple", LETTERS)?;
        Ok(Self::new("simple", TextAnalyzer::builder(tokenizer).filter(LowerCaser).build()))
    }

    /// Whitespace-separated terms, case preserved.
    pub fn whitespace() -> Self {
        Self::new("whitespace", TextAnalyzer::builder(WhitespaceTokenizer::default()).build())
    }

    /// The whole input as a single term.
    pub fn keyword() -> Self {
        Self::new("keyword", TextAnalyzer::builder(RawTokenizer::default()).build())
    }

    /// Lowercased matches of `pattern`; each match is one term.
    pub fn pattern(pattern: &str) -> Result<Self> {
        let name = format!("pattern:{}", pattern);
        let tokenizer = regex_tokenizer(&name, pattern)?;
        Ok(Self::new(name, TextAnalyzer::builder(tokenizer).filter(LowerCaser).build()))
    }
}

fn regex_tokenizer(name: &str, pattern: &str) -> Result<RegexTokenizer> {
    RegexTokenizer::new(pattern)
        .map_err(|e| IndexError::UnknownAnalyzer(format!("{} ({})", name, e)))
}

impl Analyzer for BuiltinAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    fn tokens(&self, text: &str) -> Vec<Token> {
        let mut analyzer = self.inner.clone();
        let mut stream = analyzer.token_stream(text);
        let mut out = Vec::new();
        while stream.advance() {
            let token = stream.token();
            out.push(Token {
                term: token.text.clone(),
                position: token.position as u32,
                start: token.offset_from,
                end: token.offset_to,
            });
        }
        out
    }
}

impl fmt::Debug for BuiltinAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinAnalyzer").field("name", &self.name).finish()
    }
}

/// Resolve an analyzer by name.
///
/// Accepts the short names (`standard`, `simple`, `whitespace`, `keyword`,
/// `pattern:<regex>`) as well as class-style names such as
/// `org.apache.lucene.analysis.core.WhitespaceAnalyzer`.
pub fn analyzer_for_name(name: &str) -> Result<Arc<dyn Analyzer>> {
    if let Some(pattern) = name.strip_prefix("pattern:") {
        return Ok(Arc::new(BuiltinAnalyzer::pattern(pattern)?));
    }
    let simple_name = name.rsplit('.').next().unwrap_or(name).to_ascii_lowercase();
    let short = simple_name.strip_suffix("analyzer").unwrap_or(&simple_name);
    let analyzer = match short {
        "standard" => BuiltinAnalyzer::standard(),
        "simple" => BuiltinAnalyzer::simple()?,
        "whitespace" => BuiltinAnalyzer::whitespace(),
        "keyword" => BuiltinAnalyzer::keyword(),
        _ => return Err(IndexError::UnknownAnalyzer(name.to_string())),
    };
    Ok(Arc::new(analyzer))
}
