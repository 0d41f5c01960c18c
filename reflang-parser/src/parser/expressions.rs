// Expression parsing module
// Handles operator precedence, binary operations and function calls

use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};

use crate::ast::*;
use crate::error::*;
use crate::parser::{ReflangParser, Rule};

impl ReflangParser {
    /// Binary operator precedence parser
    /// Precedence levels from lowest to highest
    pub(crate) fn pratt_parser() -> PrattParser<Rule> {
        PrattParser::new()
            // Level 1: Logical OR
            .op(Op::infix(Rule::op_or, Assoc::Left))
            // Level 2: Logical AND
            .op(Op::infix(Rule::op_and, Assoc::Left))
            // Level 3: Equality
            .op(Op::infix(Rule::op_equal, Assoc::Left) | Op::infix(Rule::op_not_equal, Assoc::Left))
            // Level 4: Comparison
            .op(Op::infix(Rule::op_less, Assoc::Left)
                | Op::infix(Rule::op_less_equal, Assoc::Left)
                | Op::infix(Rule::op_greater, Assoc::Left)
                | Op::infix(Rule::op_greater_equal, Assoc::Left))
            // Level 5: Additive
            .op(Op::infix(Rule::op_add, Assoc::Left) | Op::infix(Rule::op_subtract, Assoc::Left))
            // Level 6: Multiplicative
            .op(Op::infix(Rule::op_multiply, Assoc::Left)
                | Op::infix(Rule::op_divide, Assoc::Left)
                | Op::infix(Rule::op_modulo, Assoc::Left))
    }

    /// Parse expression using precedence climbing
    pub(crate) fn parse_expression_with_precedence(pairs: Pairs<Rule>) -> ParseResult<Expression> {
        Self::pratt_parser()
            .map_primary(Self::parse_operand)
            .map_infix(
                |left: ParseResult<Expression>, op: Pair<Rule>, right: ParseResult<Expression>| {
                    let left = left?;
                    let right = right?;

                    let operator = match op.as_rule() {
                        Rule::op_or => BinaryOperator::LogicalOr,
                        Rule::op_and => BinaryOperator::LogicalAnd,
                        Rule::op_equal => BinaryOperator::Equal,
                        Rule::op_not_equal => BinaryOperator::NotEqual,
                        Rule::op_less => BinaryOperator::Less,
                        Rule::op_less_equal => BinaryOperator::LessEqual,
                        Rule::op_greater => BinaryOperator::Greater,
                        Rule::op_greater_equal => BinaryOperator::GreaterEqual,
                        Rule::op_add => BinaryOperator::Add,
                        Rule::op_subtract => BinaryOperator::Subtract,
                        Rule::op_multiply => BinaryOperator::Multiply,
                        Rule::op_divide => BinaryOperator::Divide,
                        Rule::op_modulo => BinaryOperator::Modulo,
                        other => {
                            let span = Self::span_from_pair(&op);
                            return Err(ParseError::unexpected_rule(
                                span.into(),
                                "binary operator",
                                Some(other),
                            ));
                        }
                    };

                    let span = Self::span_from_range(left.span.start, right.span.end);

                    Ok(Expression {
                        kind: ExpressionKind::BinaryOp(BinaryOperation {
                            left: Box::new(left),
                            operator,
                            right: Box::new(right),
                            span,
                        }),
                        span,
                    })
                },
            )
            .parse(pairs)
    }

    /// Parse an `expression` pair (full precedence support)
    pub(crate) fn parse_expression_from_pair(pair: Pair<Rule>) -> ParseResult<Expression> {
        match pair.as_rule() {
            Rule::expression => Self::parse_expression_with_precedence(pair.into_inner()),
            _ => Self::parse_operand(pair),
        }
    }

    /// Parse a single operand of an infix chain
    fn parse_operand(pair: Pair<Rule>) -> ParseResult<Expression> {
        let span = Self::span_from_pair(&pair);

        let kind = match pair.as_rule() {
            Rule::expression => return Self::parse_expression_from_pair(pair),
            Rule::call => ExpressionKind::FunctionCall(Self::parse_call(pair)?),
            Rule::bool_literal => ExpressionKind::Boolean(Self::parse_bool_literal(pair)),
            Rule::int_literal => ExpressionKind::Integer(Self::parse_int_literal(pair)?),
            Rule::string_literal => ExpressionKind::String(Self::parse_string_literal(pair)?),
            Rule::identifier => ExpressionKind::Identifier(Self::parse_identifier(pair)),
            other => {
                return Err(ParseError::unexpected_rule(
                    span.into(),
                    "expression",
                    Some(other),
                ))
            }
        };

        Ok(Expression { kind, span })
    }

    fn parse_call(pair: Pair<Rule>) -> ParseResult<FunctionCall> {
        let span = Self::span_from_pair(&pair);
        let mut inner = pair.into_inner();

        let callee = Self::parse_identifier(Self::expect_pair(&mut inner, Rule::identifier, span)?);
        let arguments = inner
            .map(Self::parse_expression_from_pair)
            .collect::<ParseResult<Vec<_>>>()?;

        Ok(FunctionCall {
            callee,
            arguments,
            span,
        })
    }
}
