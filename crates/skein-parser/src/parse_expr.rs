//! Condition expression parsing by precedence climbing.
//!
//! Precedence (lowest → highest):
//! 1. `||`
//! 2. `&&`
//! 3. `==`, `!=`
//! 4. `<`, `<=`, `>`, `>=`
//!
//! Unary `!` binds tighter than every binary operator; parentheses group.
//! All binary operators are left-associative.

use skein_lexer::{Lexer, TokenKind};
use skein_types::ast::{BinOp, Expr, UnaryOp};
use skein_types::{ExprError, Value};

/// Maximum nesting of parentheses and `!` before parsing gives up.
pub const MAX_EXPR_DEPTH: usize = 64;

/// Parse condition text into an expression.
///
/// Blank text parses to the literal `true`: a missing condition always holds.
pub fn parse_expression(source: &str) -> Result<Expr, ExprError> {
    ExprParser::new(source).parse()
}

struct ExprParser {
    lexer: Lexer,
    depth: usize,
}

impl ExprParser {
    fn new(source: &str) -> Self {
        Self {
            lexer: Lexer::new(source),
            depth: 0,
        }
    }

    fn parse(mut self) -> Result<Expr, ExprError> {
        if self.lexer.peek()?.kind == TokenKind::Eof {
            return Ok(Expr::Literal(Value::Bool(true)));
        }
        let expr = self.parse_binary(1)?;
        let trailing = self.lexer.next_token()?;
        if trailing.kind != TokenKind::Eof {
            return Err(ExprError::TrailingToken {
                found: trailing.kind.to_string(),
                pos: trailing.pos,
            });
        }
        Ok(expr)
    }

    /// Parse operators binding at least as tightly as `min_precedence`.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        loop {
            let Some(op) = binary_op(&self.lexer.peek()?.kind) else {
                break;
            };
            if op.precedence() < min_precedence {
                break;
            }
            self.lexer.next_token()?;
            let right = self.parse_binary(op.precedence() + 1)?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.lexer.peek()?.kind == TokenKind::Bang {
            let bang = self.lexer.next_token()?;
            self.enter(bang.pos)?;
            let operand = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let token = self.lexer.next_token()?;
        let expr = match token.kind {
            TokenKind::Number(n) => Expr::Literal(Value::Number(n)),
            TokenKind::String(s) => Expr::Literal(Value::String(s)),
            TokenKind::True => Expr::Literal(Value::Bool(true)),
            TokenKind::False => Expr::Literal(Value::Bool(false)),
            TokenKind::Null => Expr::Literal(Value::Null),
            TokenKind::Identifier(name) => Expr::Variable(name),
            TokenKind::LParen => {
                self.enter(token.pos)?;
                let inner = self.parse_binary(1)?;
                self.depth -= 1;
                let close = self.lexer.next_token()?;
                if close.kind != TokenKind::RParen {
                    return Err(ExprError::UnexpectedToken {
                        found: close.kind.to_string(),
                        pos: close.pos,
                    });
                }
                inner
            }
            other => {
                return Err(ExprError::UnexpectedToken {
                    found: other.to_string(),
                    pos: token.pos,
                })
            }
        };
        Ok(expr)
    }

    fn enter(&mut self, pos: usize) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_EXPR_DEPTH {
            return Err(ExprError::TooDeep {
                limit: MAX_EXPR_DEPTH,
                pos,
            });
        }
        Ok(())
    }
}

fn binary_op(kind: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::OrOr => Some(BinOp::Or),
        TokenKind::AndAnd => Some(BinOp::And),
        TokenKind::EqEq => Some(BinOp::Eq),
        TokenKind::BangEq => Some(BinOp::NotEq),
        TokenKind::Less => Some(BinOp::Less),
        TokenKind::LessEq => Some(BinOp::LessEq),
        TokenKind::Greater => Some(BinOp::Greater),
        TokenKind::GreaterEq => Some(BinOp::GreaterEq),
        _ => None,
    }
}
