// Literal parsing module
// Handles identifiers, integers, booleans and strings with escapes

use pest::iterators::Pair;

use crate::ast::*;
use crate::error::*;
use crate::parser::{ReflangParser, Rule};

impl ReflangParser {
    pub(crate) fn parse_identifier(pair: Pair<Rule>) -> Identifier {
        Identifier {
            name: pair.as_str().to_string(),
            span: Self::span_from_pair(&pair),
        }
    }

    pub(crate) fn parse_bool_literal(pair: Pair<Rule>) -> BoolLiteral {
        BoolLiteral {
            value: pair.as_str() == "true",
            span: Self::span_from_pair(&pair),
        }
    }

    pub(crate) fn parse_int_literal(pair: Pair<Rule>) -> ParseResult<IntLiteral> {
        let span = Self::span_from_pair(&pair);
        let text = pair.as_str();

        let value = text
            .parse::<i32>()
            .map_err(|_| ParseError::InvalidInteger {
                src: String::new(),
                span: span.into(),
                found: text.to_string(),
            })?;

        Ok(IntLiteral { value, span })
    }

    pub(crate) fn parse_string_literal(pair: Pair<Rule>) -> ParseResult<StringLiteral> {
        let span = Self::span_from_pair(&pair);
        let value = match pair.into_inner().next() {
            Some(content) => {
                let content_start = content.as_span().start();
                Self::unescape(content.as_str(), content_start)?
            }
            None => String::new(),
        };

        Ok(StringLiteral { value, span })
    }

    /// Resolve backslash escapes; `offset` is the byte offset of `raw` in the source
    fn unescape(raw: &str, offset: usize) -> ParseResult<String> {
        let mut result = String::with_capacity(raw.len());
        let mut chars = raw.char_indices();

        while let Some((index, c)) = chars.next() {
            if c != '\\' {
                result.push(c);
                continue;
            }

            match chars.next() {
                Some((_, 'n')) => result.push('\n'),
                Some((_, 't')) => result.push('\t'),
                Some((_, 'r')) => result.push('\r'),
                Some((_, '\\')) => result.push('\\'),
                Some((_, '"')) => result.push('"'),
                Some((_, other)) => {
                    let start = offset + index;
                    return Err(ParseError::InvalidStringEscape {
                        src: String::new(),
                        span: (start, 1 + other.len_utf8()).into(),
                        found: format!("\\{}", other),
                    });
                }
                None => {
                    return Err(ParseError::InvalidStringEscape {
                        src: String::new(),
                        span: (offset + index, 1).into(),
                        found: "\\".to_string(),
                    });
                }
            }
        }

        Ok(result)
    }
}
