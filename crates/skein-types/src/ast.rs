//! AST node types for dialogue scripts and condition expressions.
//!
//! Script nodes keep source order: steps are stored exactly as written and
//! `If` steps keep their branches nested rather than flattened.

use crate::{Span, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ══════════════════════════════════════════════════════════════════════════════
// Names
// ══════════════════════════════════════════════════════════════════════════════

/// Canonical form of a node or variable name.
///
/// Both node names and variable names compare case-insensitively; every map
/// keyed by such a name stores and looks up the folded form.
pub fn fold_name(name: &str) -> String {
    name.trim().to_lowercase()
}

// ══════════════════════════════════════════════════════════════════════════════
// Node graph
// ══════════════════════════════════════════════════════════════════════════════

/// All nodes of a parsed script, keyed by folded name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeGraph {
    nodes: BTreeMap<String, Node>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. A node with the same folded name is replaced and
    /// returned.
    pub fn insert(&mut self, node: Node) -> Option<Node> {
        self.nodes.insert(fold_name(&node.name), node)
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.nodes.get(&fold_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(&fold_name(name))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in folded-name order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }
}

/// `title: Name` … `---` … `===`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Name as written after `title:`, trimmed.
    pub name: String,
    pub steps: Vec<Step>,
    pub span: Span,
}

impl Node {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Steps
// ══════════════════════════════════════════════════════════════════════════════

/// One executable unit inside a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// A line of dialogue. May contain `{name}` interpolation tokens.
    Line(LineStep),
    /// A block of `->` choice entries.
    Choice(ChoiceStep),
    /// `<<jump …>>` or `<<set …>>`
    Command(CommandStep),
    /// `<<if …>>` … `[<<else>>]` … `<<endif>>`
    If(IfStep),
}

impl Step {
    pub fn span(&self) -> Span {
        match self {
            Step::Line(s) => s.span,
            Step::Choice(s) => s.span,
            Step::Command(s) => s.span,
            Step::If(s) => s.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStep {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceStep {
    pub entries: Vec<ChoiceEntry>,
    /// Smallest `[time …]` value among the entries, in seconds.
    pub time_limit: Option<f64>,
    /// Entry selected on timeout, as an index into the *displayed* entries.
    pub default_option: usize,
    pub span: Span,
}

/// `-> text [if cond] [time seconds]` plus its indented commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceEntry {
    pub text: String,
    /// Raw condition text. A leading `!` negates the rest.
    pub condition: Option<String>,
    pub commands: Vec<Command>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandStep {
    pub command: Command,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStep {
    /// Raw condition text; evaluated when the step runs. Empty means true.
    pub condition: String,
    pub then_steps: Vec<Step>,
    pub else_steps: Vec<Step>,
    pub span: Span,
}

impl IfStep {
    pub fn branch(&self, branch: Branch) -> &[Step] {
        match branch {
            Branch::Then => &self.then_steps,
            Branch::Else => &self.else_steps,
        }
    }
}

/// Which arm of an [`IfStep`] was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Branch {
    Then,
    Else,
}

/// A command executed by a command step or a selected choice entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// `jump Target`
    Jump { target: String },
    /// `set name = value`
    Set { name: String, value: Value },
}

// ══════════════════════════════════════════════════════════════════════════════
// Condition expressions
// ══════════════════════════════════════════════════════════════════════════════

/// A parsed condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `true`, `false`, `null`, `42`, `"text"`
    Literal(Value),
    /// A variable reference, resolved at evaluation time.
    Variable(String),
    /// `!operand`
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// `left op right`
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl BinOp {
    /// Binding strength; higher binds tighter. All binary operators are
    /// left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::NotEq => 3,
            BinOp::Less | BinOp::LessEq | BinOp::Greater | BinOp::GreaterEq => 4,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Less => "<",
            BinOp::LessEq => "<=",
            BinOp::Greater => ">",
            BinOp::GreaterEq => ">=",
        }
    }
}
