//! Thread-local parser pool for reusing tree-sitter Parser instances.
//!
//! Creating a `Parser` and loading a grammar per file is wasted work. Each
//! thread keeps one parser per language, created on first use.
//!
//! # Design
//!
//! - Thread-local storage: concurrent pipeline runs on different threads
//!   never share a parser
//! - Lazy initialization: parsers created on first use per thread
//! - No locks: RefCell provides single-threaded mutable access

use std::cell::RefCell;
use std::thread::LocalKey;

use crate::ingest::detect::Language;
use crate::ingest::parse::ParseError;

type ParserCell = RefCell<Option<tree_sitter::Parser>>;

thread_local! {
    static TYPESCRIPT_PARSER: ParserCell = const { RefCell::new(None) };
    static TSX_PARSER: ParserCell = const { RefCell::new(None) };
    static JAVASCRIPT_PARSER: ParserCell = const { RefCell::new(None) };
    static PYTHON_PARSER: ParserCell = const { RefCell::new(None) };
}

fn cell_for(language: Language) -> &'static LocalKey<ParserCell> {
    match language {
        Language::TypeScript => &TYPESCRIPT_PARSER,
        Language::Tsx => &TSX_PARSER,
        Language::JavaScript => &JAVASCRIPT_PARSER,
        Language::Python => &PYTHON_PARSER,
    }
}

fn new_parser(language: Language) -> Result<tree_sitter::Parser, ParseError> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&language.grammar())
        .map_err(|e| ParseError::Grammar {
            language,
            message: e.to_string(),
        })?;
    Ok(parser)
}

/// Execute a function with the thread-local parser for `language`
///
/// # Example
///
/// ```rust
/// use meridian::ingest::pool::with_parser;
/// use meridian::ingest::Language;
///
/// let tree = with_parser(Language::Python, |parser| parser.parse("def f(): pass", None))
///     .unwrap();
/// assert!(tree.is_some());
/// ```
pub fn with_parser<F, R>(language: Language, f: F) -> Result<R, ParseError>
where
    F: FnOnce(&mut tree_sitter::Parser) -> R,
{
    cell_for(language).with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(new_parser(language)?);
        }
        slot.as_mut()
            .map(f)
            .ok_or(ParseError::ParserUnavailable(language))
    })
}

/// Initialize every parser on the calling thread
pub fn warmup_parsers() -> Result<(), ParseError> {
    for language in [
        Language::TypeScript,
        Language::Tsx,
        Language::JavaScript,
        Language::Python,
    ] {
        with_parser(language, |_| ())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_reuse() {
        let addr1 = with_parser(Language::Python, |p| p as *const _ as usize).unwrap();
        let addr2 = with_parser(Language::Python, |p| p as *const _ as usize).unwrap();
        assert_eq!(addr1, addr2, "Parser should be reused in same thread");
    }

    #[test]
    fn test_multiple_languages_same_thread() {
        let test_cases: [(Language, &[u8]); 4] = [
            (Language::Python, b"def test(): pass"),
            (Language::JavaScript, b"function test() {}"),
            (Language::TypeScript, b"function test(): void {}"),
            (Language::Tsx, b"const App = () => <div />;"),
        ];

        for (lang, source) in test_cases {
            let tree = with_parser(lang, |parser| parser.parse(source, None))
                .unwrap()
                .unwrap();
            assert!(
                !tree.root_node().has_error(),
                "Language {:?} should parse cleanly",
                lang
            );
        }
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::{Arc, Barrier};
        use std::thread;

        let source = b"def test(): pass";
        let barrier = Arc::new(Barrier::new(2));
        let barrier_clone = barrier.clone();

        let handle = thread::spawn(move || {
            barrier_clone.wait();
            with_parser(Language::Python, |parser| parser.parse(source, None))
                .unwrap()
                .is_some()
        });

        barrier.wait();
        let main_result = with_parser(Language::Python, |parser| parser.parse(source, None))
            .unwrap()
            .is_some();

        assert!(main_result);
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_warmup_parsers() {
        warmup_parsers().unwrap();
    }
}
