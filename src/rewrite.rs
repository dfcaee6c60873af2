//! Applies replacement expressions to scanned declaration slots.
//!
//! Statements with a substituted slot are re-rendered as single logical
//! lines at their original indentation; everything else keeps its captured
//! source text byte for byte.

use std::collections::BTreeMap;

use paramcore::{ParamError, Result};
use pylang::render_stmt_line;
use pylang::{Expr, Module, Stmt};

use crate::scan::{DeclSite, Slot};

/// Replaces each addressed slot with its expression, then re-renders every
/// touched statement once. Keys are arena indices into `sites`.
pub fn apply(module: &mut Module, sites: &[DeclSite], subs: &BTreeMap<usize, Expr>) -> Result<()> {
    let mut touched: Vec<&[usize]> = Vec::new();
    for (&idx, replacement) in subs {
        let site = sites
            .get(idx)
            .filter(|s| s.index == idx)
            .ok_or_else(stale)?;
        let stmt = stmt_at(&mut module.body, &site.path.stmts).ok_or_else(stale)?;
        place(stmt, &site.path.slot, replacement.clone())?;
        if !touched.iter().any(|t| *t == site.path.stmts.as_slice()) {
            touched.push(&site.path.stmts);
        }
    }
    for path in touched {
        let stmt = stmt_at(&mut module.body, path).ok_or_else(stale)?;
        let rendered = render_stmt_line(stmt);
        set_raw(stmt, rendered);
    }
    Ok(())
}

fn stmt_at<'a>(mut body: &'a mut Vec<Stmt>, stmts: &[usize]) -> Option<&'a mut Stmt> {
    let (&last, rest) = stmts.split_last()?;
    for &i in rest {
        body = body.get_mut(i)?.body_mut()?;
    }
    body.get_mut(last)
}

fn place(stmt: &mut Stmt, slot: &Slot, replacement: Expr) -> Result<()> {
    match (slot, stmt) {
        (Slot::Value, Stmt::Assign { value, .. })
        | (Slot::Value, Stmt::AnnAssign { value, .. }) => {
            *value = replacement;
            Ok(())
        }
        (Slot::Default(pi), Stmt::FunctionDef { params, .. }) => {
            let param = params.get_mut(*pi).ok_or_else(stale)?;
            param.default = Some(replacement);
            Ok(())
        }
        (Slot::ValueKw(chain), Stmt::Assign { value, .. })
        | (Slot::ValueKw(chain), Stmt::AnnAssign { value, .. }) => {
            place_kwarg(value, chain, replacement)
        }
        (Slot::DefaultKw(pi, chain), Stmt::FunctionDef { params, .. }) => {
            let param = params.get_mut(*pi).ok_or_else(stale)?;
            let default = param.default.as_mut().ok_or_else(stale)?;
            place_kwarg(default, chain, replacement)
        }
        _ => Err(stale()),
    }
}

fn place_kwarg(expr: &mut Expr, chain: &[usize], replacement: Expr) -> Result<()> {
    let (&first, rest) = chain.split_first().ok_or_else(stale)?;
    let Expr::Call { kwargs, .. } = expr else {
        return Err(stale());
    };
    let value = &mut kwargs.get_mut(first).ok_or_else(stale)?.1;
    if rest.is_empty() {
        *value = replacement;
        Ok(())
    } else {
        place_kwarg(value, rest, replacement)
    }
}

fn set_raw(stmt: &mut Stmt, rendered: String) {
    match stmt {
        Stmt::Assign { raw, .. }
        | Stmt::AnnAssign { raw, .. }
        | Stmt::FunctionDef { raw, .. }
        | Stmt::Block { raw, .. }
        | Stmt::ExprStmt { raw, .. } => *raw = rendered,
        Stmt::Raw { text, .. } => *text = rendered,
    }
}

// Sites address the tree they were scanned from; anything else is a caller
// bug surfaced as an error instead of a panic.
fn stale() -> ParamError {
    ParamError::UnsupportedSyntax {
        kind: "rewrite".to_string(),
        detail: "declaration site does not address this tree".to_string(),
    }
}
