//! Skein parsers: dialogue script text into a [`NodeGraph`], and condition
//! text into an expression AST.
//!
//! [`NodeGraph`]: skein_types::ast::NodeGraph

mod parse_choice;
mod parse_command;
mod parse_expr;
mod parser;

pub use parse_command::{parse_command, parse_literal, CommandSyntaxError};
pub use parse_expr::{parse_expression, MAX_EXPR_DEPTH};
pub use parser::parse_script;
