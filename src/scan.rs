//! Single-pass declaration scanner over the parsed source tree.

use paramcore::{ParamError, Result};
use pylang::{lex, Expr, Module, Stmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    Assign,
    AnnAssign,
    FnDefault,
    CallKw,
}

/// Which expression slot of the addressed statement holds the marker call.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// value of an assignment
    Value,
    /// default of the i-th function parameter
    Default(usize),
    /// keyword-argument chain under an assignment's value call
    ValueKw(Vec<usize>),
    /// keyword-argument chain under the i-th parameter's default call
    DefaultKw(usize, Vec<usize>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitePath {
    /// statement index chain from the module root
    pub stmts: Vec<usize>,
    pub slot: Slot,
}

/// One located marker declaration. Owned by the scan pass that produced it
/// and consumed by at most one rewrite pass over the same tree.
#[derive(Debug, Clone)]
pub struct DeclSite {
    pub index: usize,
    pub kind: SiteKind,
    pub name: String,
    pub line: usize,
    pub indent: usize,
    pub call: Expr,
    pub path: SitePath,
}

/// A bare directive statement such as `IncludeSource('a.b')`.
#[derive(Debug, Clone)]
pub struct DirectiveSite {
    pub line: usize,
    pub indent: usize,
    pub call: Expr,
    pub raw: String,
}

/// Collects every declaration bound to the given marker name, in statement
/// order. A nested body is scanned before the enclosing function's own
/// defaults; assignments recurse into call keyword arguments only.
pub fn scan_params(module: &Module, marker: &str) -> Result<Vec<DeclSite>> {
    let mut scan = Scan {
        marker,
        sites: Vec::new(),
        stmts: Vec::new(),
    };
    scan.body(&module.body)?;
    Ok(scan.sites)
}

/// Collects bare expression statements calling the directive name, at
/// module level and inside function bodies.
pub fn scan_directives(module: &Module, directive: &str) -> Vec<DirectiveSite> {
    let mut out = Vec::new();
    directive_body(&module.body, directive, &mut out);
    out
}

fn directive_body(body: &[Stmt], directive: &str, out: &mut Vec<DirectiveSite>) {
    for stmt in body {
        match stmt {
            Stmt::FunctionDef { body, .. } => directive_body(body, directive, out),
            Stmt::ExprStmt {
                value,
                raw,
                indent,
                line,
            } => {
                if value.is_call_to(directive) {
                    out.push(DirectiveSite {
                        line: *line,
                        indent: *indent,
                        call: value.clone(),
                        raw: raw.clone(),
                    });
                }
            }
            _ => {}
        }
    }
}

#[derive(Clone, Copy)]
enum SlotBase {
    Value,
    Default(usize),
}

fn make_slot(base: SlotBase, chain: &[usize]) -> Slot {
    match base {
        SlotBase::Value => Slot::ValueKw(chain.to_vec()),
        SlotBase::Default(pi) => Slot::DefaultKw(pi, chain.to_vec()),
    }
}

struct Scan<'a> {
    marker: &'a str,
    sites: Vec<DeclSite>,
    stmts: Vec<usize>,
}

impl Scan<'_> {
    fn body(&mut self, body: &[Stmt]) -> Result<()> {
        for (i, stmt) in body.iter().enumerate() {
            self.stmts.push(i);
            self.stmt(stmt)?;
            self.stmts.pop();
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<()> {
        if let Some(body) = stmt.body() {
            self.body(body)?;
        }
        match stmt {
            Stmt::FunctionDef {
                params,
                indent,
                line,
                ..
            } => {
                for (pi, param) in params.iter().enumerate() {
                    let Some(default) = &param.default else {
                        continue;
                    };
                    if default.is_call_to(self.marker) {
                        self.push(
                            SiteKind::FnDefault,
                            &param.name,
                            *line,
                            *indent,
                            default,
                            Slot::Default(pi),
                        );
                    } else if default.call_name().is_some() {
                        let mut chain = Vec::new();
                        self.kwargs(default, *line, *indent, SlotBase::Default(pi), &mut chain);
                    }
                }
            }
            Stmt::Assign {
                target,
                value,
                indent,
                line,
                ..
            } => self.assign(SiteKind::Assign, target, value, *indent, *line)?,
            Stmt::AnnAssign {
                target,
                value,
                indent,
                line,
                ..
            } => self.assign(SiteKind::AnnAssign, target, value, *indent, *line)?,
            Stmt::Raw { text, line } => self.check_raw(text, *line)?,
            _ => {}
        }
        Ok(())
    }

    fn assign(
        &mut self,
        kind: SiteKind,
        target: &str,
        value: &Expr,
        indent: usize,
        line: usize,
    ) -> Result<()> {
        if value.is_call_to(self.marker) {
            if !plain_target(target) {
                return Err(ParamError::UnsupportedSyntax {
                    kind: "assignment".to_string(),
                    detail: format!("marker bound to non-name target `{target}` on line {line}"),
                });
            }
            self.push(kind, target, line, indent, value, Slot::Value);
        } else if value.call_name().is_some() {
            let mut chain = Vec::new();
            self.kwargs(value, line, indent, SlotBase::Value, &mut chain);
        }
        Ok(())
    }

    // Only keyword arguments are searched; positionals carry no name to
    // declare under.
    fn kwargs(
        &mut self,
        call: &Expr,
        line: usize,
        indent: usize,
        base: SlotBase,
        chain: &mut Vec<usize>,
    ) {
        let Expr::Call { kwargs, .. } = call else {
            return;
        };
        for (ki, (kw, value)) in kwargs.iter().enumerate() {
            chain.push(ki);
            if value.is_call_to(self.marker) {
                self.push(
                    SiteKind::CallKw,
                    kw,
                    line,
                    indent,
                    value,
                    make_slot(base, chain),
                );
            } else if value.call_name().is_some() {
                self.kwargs(value, line, indent, base, chain);
            }
            chain.pop();
        }
    }

    fn check_raw(&self, text: &str, line: usize) -> Result<()> {
        if !text.contains(self.marker) {
            return Ok(());
        }
        let stripped = text
            .lines()
            .map(lex::strip_comment)
            .collect::<Vec<_>>()
            .join("\n");
        if stripped.contains(self.marker) && lex::bare_eq_positions(&stripped).len() >= 2 {
            return Err(ParamError::UnsupportedSyntax {
                kind: "assignment".to_string(),
                detail: format!("chained assignment with a marker on line {line}"),
            });
        }
        Ok(())
    }

    fn push(
        &mut self,
        kind: SiteKind,
        name: &str,
        line: usize,
        indent: usize,
        call: &Expr,
        slot: Slot,
    ) {
        self.sites.push(DeclSite {
            index: self.sites.len(),
            kind,
            name: name.to_string(),
            line,
            indent,
            call: call.clone(),
            path: SitePath {
                stmts: self.stmts.clone(),
                slot,
            },
        });
    }
}

fn plain_target(target: &str) -> bool {
    let mut chars = target.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
