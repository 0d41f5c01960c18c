// Reflang Parser
// Builds the AST from the pest parse tree

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::ast::*;
use crate::error::*;

mod expressions;
mod literals;
mod statements;

#[derive(Parser)]
#[grammar = "reflang.pest"]
pub struct ReflangParser;

impl ReflangParser {
    /// Parse a complete compilation unit
    pub fn parse_program(input: &str) -> ParseResult<Program> {
        let mut pairs = <Self as Parser<Rule>>::parse(Rule::program, input)
            .map_err(|error| ParseError::from_pest_error(error, input.to_string()))?;

        let program_pair = pairs
            .next()
            .ok_or_else(|| ParseError::unexpected_rule((0, 0).into(), "program", None))
            .map_err(|error| error.with_source(input))?;

        Self::build_program(program_pair).map_err(|error| error.with_source(input))
    }

    /// Parse a single expression (mainly for tests and tooling)
    pub fn parse_expression(input: &str) -> ParseResult<Expression> {
        let mut pairs = <Self as Parser<Rule>>::parse(Rule::expression_input, input)
            .map_err(|error| ParseError::from_pest_error(error, input.to_string()))?;

        let result = match pairs.next() {
            Some(pair) => {
                let span = Self::span_from_pair(&pair);
                let mut inner = pair.into_inner();
                let expression = Self::expect_pair(&mut inner, Rule::expression, span)?;
                Self::parse_expression_from_pair(expression)
            }
            None => Err(ParseError::unexpected_rule(
                (0, 0).into(),
                "expression",
                None,
            )),
        };

        result.map_err(|error| error.with_source(input))
    }

    fn build_program(pair: Pair<Rule>) -> ParseResult<Program> {
        let span = Self::span_from_pair(&pair);
        let mut statements = Vec::new();

        for inner_pair in pair.into_inner() {
            match inner_pair.as_rule() {
                Rule::EOI => {}
                _ => statements.push(Self::parse_statement(inner_pair)?),
            }
        }

        Ok(Program { statements, span })
    }

    pub(crate) fn span_from_pair(pair: &Pair<Rule>) -> Span {
        let pest_span = pair.as_span();
        Span::new(pest_span.start(), pest_span.end())
    }

    pub(crate) fn span_from_range(start: usize, end: usize) -> Span {
        Span::new(start, end)
    }

    /// Keyword tokens carry no information once the rule matched
    pub(crate) fn is_keyword(rule: Rule) -> bool {
        matches!(
            rule,
            Rule::kw_fn
                | Rule::kw_extern
                | Rule::kw_return
                | Rule::kw_while
                | Rule::kw_if
                | Rule::kw_else
        )
    }

    /// Children of a pair with keyword tokens filtered out
    pub(crate) fn significant_children<'i>(
        pair: Pair<'i, Rule>,
    ) -> impl Iterator<Item = Pair<'i, Rule>> {
        pair.into_inner()
            .filter(|inner| !Self::is_keyword(inner.as_rule()))
    }

    /// Take the next child and require it to be `expected`
    pub(crate) fn expect_pair<'i>(
        pairs: &mut impl Iterator<Item = Pair<'i, Rule>>,
        expected: Rule,
        parent: Span,
    ) -> ParseResult<Pair<'i, Rule>> {
        match pairs.next() {
            Some(pair) if pair.as_rule() == expected => Ok(pair),
            Some(pair) => {
                let span = Self::span_from_pair(&pair);
                Err(ParseError::unexpected_rule(
                    span.into(),
                    &format!("{:?}", expected),
                    Some(pair.as_rule()),
                ))
            }
            None => Err(ParseError::unexpected_rule(
                parent.into(),
                &format!("{:?}", expected),
                None,
            )),
        }
    }
}
