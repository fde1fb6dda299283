//! Formula Abstract Syntax Tree types

use dosekit_core::{parse_path, PathSegment};

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Numeric literal (reserved constants such as `PI` are folded into this)
    Number(f64),
    /// String literal, only meaningful as a function argument (unit symbols)
    String(String),

    // === References ===
    /// Variable path into the context
    Variable(VariableRef),

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    // === Function call ===
    Function {
        name: String,
        args: Vec<FormulaExpr>,
    },
}

impl FormulaExpr {
    /// Collect every variable reference in the expression, in source order
    pub fn variables(&self) -> Vec<&VariableRef> {
        let mut refs = Vec::new();
        self.collect_variables(&mut refs);
        refs
    }

    fn collect_variables<'a>(&'a self, refs: &mut Vec<&'a VariableRef>) {
        match self {
            FormulaExpr::Number(_) | FormulaExpr::String(_) => {}
            FormulaExpr::Variable(var) => refs.push(var),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.collect_variables(refs);
                right.collect_variables(refs);
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.collect_variables(refs),
            FormulaExpr::Function { args, .. } => {
                for arg in args {
                    arg.collect_variables(refs);
                }
            }
        }
    }
}

/// A variable path as written in the formula, with its parsed segments
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRef {
    /// Source text (`patient.weight`, `values[0]`)
    pub path: String,
    /// Parsed path segments
    pub segments: Vec<PathSegment>,
}

impl VariableRef {
    /// Create a reference from its source text
    pub fn new<S: Into<String>>(path: S) -> Self {
        let path = path.into();
        let segments = parse_path(&path);
        Self { path, segments }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}
