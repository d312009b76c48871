// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Analyzed expressions referenced by plan nodes and sinks

use fe_catalog::PartitionValue;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Eq,
    NotDistinct,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn is_equivalence(&self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::NotDistinct)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotDistinct => "IS NOT DISTINCT FROM",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        };
        write!(f, "{}", op)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expr {
    SlotRef {
        #[serde(default)]
        table: Option<String>,
        column: String,
    },
    Literal {
        value: PartitionValue,
    },
    BinaryPredicate {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    FunctionCall {
        name: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn slot(table: &str, column: &str) -> Self {
        Expr::SlotRef {
            table: Some(table.to_string()),
            column: column.to_string(),
        }
    }

    pub fn column(column: &str) -> Self {
        Expr::SlotRef {
            table: None,
            column: column.to_string(),
        }
    }

    pub fn literal(value: impl Into<PartitionValue>) -> Self {
        Expr::Literal {
            value: value.into(),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::BinaryPredicate {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn equals(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Eq, left, right)
    }

    /// Operand `idx` (0 = left, 1 = right) of a binary predicate
    pub fn child(&self, idx: usize) -> Option<&Expr> {
        match (self, idx) {
            (Expr::BinaryPredicate { left, .. }, 0) => Some(left.as_ref()),
            (Expr::BinaryPredicate { right, .. }, 1) => Some(right.as_ref()),
            (Expr::FunctionCall { args, .. }, i) => args.get(i),
            _ => None,
        }
    }

    pub fn to_sql(&self) -> String {
        match self {
            Expr::SlotRef {
                table: Some(table),
                column,
            } => format!("{}.{}", table, column),
            Expr::SlotRef { table: None, column } => column.clone(),
            Expr::Literal { value } => value.to_string(),
            Expr::BinaryPredicate { op, left, right } => {
                format!("{} {} {}", left.to_sql(), op, right.to_sql())
            }
            Expr::FunctionCall { name, args } => format!("{}({})", name, to_sql_list(args)),
        }
    }
}

/// Comma-separated SQL of a list of expressions
pub fn to_sql_list(exprs: &[Expr]) -> String {
    exprs
        .iter()
        .map(|e| e.to_sql())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sql())
    }
}
