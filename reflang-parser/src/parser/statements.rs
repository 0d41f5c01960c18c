// Statement parsing module
// Handles declarations, blocks and control flow statements

use pest::iterators::Pair;

use crate::ast::*;
use crate::error::*;
use crate::parser::{ReflangParser, Rule};

impl ReflangParser {
    /// Parse any statement rule into a Statement node
    pub(crate) fn parse_statement(pair: Pair<Rule>) -> ParseResult<Statement> {
        let span = Self::span_from_pair(&pair);

        let kind = match pair.as_rule() {
            Rule::extern_decl => StatementKind::ExternFunctionDecl(Self::parse_extern_decl(pair)?),
            Rule::function_decl => StatementKind::FunctionDecl(Self::parse_function_decl(pair)?),
            Rule::while_stmt => StatementKind::While(Self::parse_while(pair)?),
            Rule::if_stmt => StatementKind::If(Self::parse_if(pair)?),
            Rule::return_stmt => StatementKind::Return(Self::parse_return(pair)?),
            Rule::block => StatementKind::Block(Self::parse_block(pair)?),
            Rule::var_decl => StatementKind::VarDecl(Self::parse_var_decl(pair)?),
            Rule::assign => StatementKind::Assign(Self::parse_assign(pair)?),
            Rule::expr_stmt => {
                let mut inner = pair.into_inner();
                let expression = Self::expect_pair(&mut inner, Rule::expression, span)?;
                StatementKind::Expression(Self::parse_expression_from_pair(expression)?)
            }
            other => {
                return Err(ParseError::unexpected_rule(
                    span.into(),
                    "statement",
                    Some(other),
                ))
            }
        };

        Ok(Statement { kind, span })
    }

    pub(crate) fn parse_block(pair: Pair<Rule>) -> ParseResult<Block> {
        let span = Self::span_from_pair(&pair);
        let statements = pair
            .into_inner()
            .map(Self::parse_statement)
            .collect::<ParseResult<Vec<_>>>()?;

        Ok(Block { statements, span })
    }

    pub(crate) fn parse_type_annotation(pair: Pair<Rule>) -> ParseResult<TypeAnnotation> {
        let span = Self::span_from_pair(&pair);
        let type_pair = pair.into_inner().next();

        let primitive = match type_pair.as_ref().map(|p| p.as_rule()) {
            Some(Rule::type_int) => PrimitiveType::Int,
            Some(Rule::type_string) => PrimitiveType::String,
            Some(Rule::type_bool) => PrimitiveType::Bool,
            other => {
                return Err(ParseError::unexpected_rule(
                    span.into(),
                    "primitive type",
                    other,
                ))
            }
        };

        Ok(TypeAnnotation { primitive, span })
    }

    fn parse_param(pair: Pair<Rule>) -> ParseResult<Param> {
        let span = Self::span_from_pair(&pair);
        let mut inner = pair.into_inner();

        let name = Self::parse_identifier(Self::expect_pair(&mut inner, Rule::identifier, span)?);
        let type_annotation = Self::parse_type_annotation(Self::expect_pair(
            &mut inner,
            Rule::primitive_type,
            span,
        )?)?;

        Ok(Param {
            name,
            type_annotation,
            span,
        })
    }

    fn parse_param_list(pair: Pair<Rule>) -> ParseResult<ParamList> {
        let span = Self::span_from_pair(&pair);
        let params = pair
            .into_inner()
            .map(Self::parse_param)
            .collect::<ParseResult<Vec<_>>>()?;

        Ok(ParamList { params, span })
    }

    /// Shared head of `fn` and `extern fn`: name, optional parameters, return type
    fn parse_signature<'i>(
        inner: &mut impl Iterator<Item = Pair<'i, Rule>>,
        span: Span,
    ) -> ParseResult<(Identifier, Option<ParamList>, TypeAnnotation)> {
        let name = Self::parse_identifier(Self::expect_pair(inner, Rule::identifier, span)?);

        let next = inner
            .next()
            .ok_or_else(|| ParseError::unexpected_rule(span.into(), "return type", None))?;

        let (params, type_pair) = match next.as_rule() {
            Rule::param_list => {
                let params = Self::parse_param_list(next)?;
                let type_pair = Self::expect_pair(inner, Rule::primitive_type, span)?;
                (Some(params), type_pair)
            }
            Rule::primitive_type => (None, next),
            other => {
                let next_span = Self::span_from_pair(&next);
                return Err(ParseError::unexpected_rule(
                    next_span.into(),
                    "parameter list or return type",
                    Some(other),
                ));
            }
        };

        let return_type = Self::parse_type_annotation(type_pair)?;
        Ok((name, params, return_type))
    }

    fn parse_function_decl(pair: Pair<Rule>) -> ParseResult<FunctionDecl> {
        let span = Self::span_from_pair(&pair);
        let mut inner = Self::significant_children(pair);

        let (name, params, return_type) = Self::parse_signature(&mut inner, span)?;
        let body = Self::parse_block(Self::expect_pair(&mut inner, Rule::block, span)?)?;

        Ok(FunctionDecl {
            name,
            params,
            return_type,
            body,
            span,
        })
    }

    fn parse_extern_decl(pair: Pair<Rule>) -> ParseResult<ExternFunctionDecl> {
        let span = Self::span_from_pair(&pair);
        let mut inner = Self::significant_children(pair);

        let (name, params, return_type) = Self::parse_signature(&mut inner, span)?;

        Ok(ExternFunctionDecl {
            name,
            params,
            return_type,
            span,
        })
    }

    fn parse_var_decl(pair: Pair<Rule>) -> ParseResult<VarDecl> {
        let span = Self::span_from_pair(&pair);
        let mut inner = pair.into_inner();

        let name = Self::parse_identifier(Self::expect_pair(&mut inner, Rule::identifier, span)?);

        let mut declared_type = None;
        let mut initializer = None;
        for inner_pair in inner {
            match inner_pair.as_rule() {
                Rule::primitive_type => {
                    declared_type = Some(Self::parse_type_annotation(inner_pair)?);
                }
                Rule::expression => {
                    initializer = Some(Self::parse_expression_from_pair(inner_pair)?);
                }
                other => {
                    let inner_span = Self::span_from_pair(&inner_pair);
                    return Err(ParseError::unexpected_rule(
                        inner_span.into(),
                        "type or initializer",
                        Some(other),
                    ));
                }
            }
        }

        Ok(VarDecl {
            name,
            declared_type,
            initializer,
            span,
        })
    }

    fn parse_assign(pair: Pair<Rule>) -> ParseResult<Assign> {
        let span = Self::span_from_pair(&pair);
        let mut inner = pair.into_inner();

        let target = Self::parse_identifier(Self::expect_pair(&mut inner, Rule::identifier, span)?);
        let value = Self::parse_expression_from_pair(Self::expect_pair(
            &mut inner,
            Rule::expression,
            span,
        )?)?;

        Ok(Assign {
            target,
            value,
            span,
        })
    }

    fn parse_return(pair: Pair<Rule>) -> ParseResult<Return> {
        let span = Self::span_from_pair(&pair);
        let mut inner = Self::significant_children(pair);

        let value = Self::parse_expression_from_pair(Self::expect_pair(
            &mut inner,
            Rule::expression,
            span,
        )?)?;

        Ok(Return { value, span })
    }

    fn parse_while(pair: Pair<Rule>) -> ParseResult<While> {
        let span = Self::span_from_pair(&pair);
        let mut inner = Self::significant_children(pair);

        let condition = Self::parse_expression_from_pair(Self::expect_pair(
            &mut inner,
            Rule::expression,
            span,
        )?)?;
        let body = Self::parse_block(Self::expect_pair(&mut inner, Rule::block, span)?)?;

        Ok(While {
            condition,
            body,
            span,
        })
    }

    fn parse_if(pair: Pair<Rule>) -> ParseResult<If> {
        let span = Self::span_from_pair(&pair);
        let mut inner = Self::significant_children(pair);

        let condition = Self::parse_expression_from_pair(Self::expect_pair(
            &mut inner,
            Rule::expression,
            span,
        )?)?;
        let then_block = Self::parse_block(Self::expect_pair(&mut inner, Rule::block, span)?)?;
        let else_block = inner.next().map(Self::parse_block).transpose()?;

        Ok(If {
            condition,
            then_block,
            else_block,
            span,
        })
    }
}
