// Rendering is asymmetric on purpose: whole modules are reassembled from the
// raw text their statements captured at parse time, while individual
// statements that carry substituted values are re-rendered from the tree as
// a single line in the target language's repr conventions.

use crate::ast::{Expr, FnParam, Module, Stmt};

pub fn render_module(m: &Module) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for s in &m.body {
        collect_raws(s, &mut lines);
    }
    let mut out = lines.join("\n");
    if m.trailing_newline {
        out.push('\n');
    }
    out
}

fn collect_raws<'a>(s: &'a Stmt, out: &mut Vec<&'a str>) {
    out.push(s.raw_text());
    if let Some(body) = s.body() {
        for child in body {
            collect_raws(child, out);
        }
    }
}

// Single-line form of one statement, at its original indentation. Used after
// a value substitution; never called on suite headers.
pub fn render_stmt_line(s: &Stmt) -> String {
    match s {
        Stmt::Assign {
            target,
            value,
            raw,
            indent,
            ..
        } => {
            let mut out = String::from(&raw[..*indent]);
            out.push_str(target);
            out.push_str(" = ");
            out.push_str(&render_expr(value));
            out
        }
        Stmt::AnnAssign {
            target,
            ann,
            value,
            raw,
            indent,
            ..
        } => {
            let mut out = String::from(&raw[..*indent]);
            out.push_str(target);
            out.push_str(": ");
            out.push_str(ann);
            out.push_str(" = ");
            out.push_str(&render_expr(value));
            out
        }
        Stmt::FunctionDef {
            name,
            params,
            suffix,
            raw,
            indent,
            ..
        } => {
            let mut out = String::from(&raw[..*indent]);
            out.push_str("def ");
            out.push_str(name);
            out.push('(');
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&render_fn_param(p));
            }
            out.push(')');
            out.push_str(suffix);
            out
        }
        Stmt::ExprStmt {
            value, raw, indent, ..
        } => {
            let mut out = String::from(&raw[..*indent]);
            out.push_str(&render_expr(value));
            out
        }
        Stmt::Block { raw, .. } => raw.clone(),
        Stmt::Raw { text, .. } => text.clone(),
    }
}

pub fn render_fn_param(p: &FnParam) -> String {
    let mut out = String::from(&p.name[..]);
    if let Some(ann) = &p.ann {
        out.push_str(": ");
        out.push_str(ann);
    }
    if let Some(d) = &p.default {
        out.push('=');
        out.push_str(&render_expr(d));
    }
    out
}

pub fn render_expr(e: &Expr) -> String {
    let mut out = String::new();
    push_expr(e, &mut out);
    out
}

fn push_expr(e: &Expr, out: &mut String) {
    match e {
        Expr::Int(v) => out.push_str(&v.to_string()),
        Expr::Float(v) => out.push_str(&float_repr(*v)),
        Expr::Str(s) => out.push_str(&str_repr(s)),
        Expr::Bool(true) => out.push_str("True"),
        Expr::Bool(false) => out.push_str("False"),
        Expr::NoneLit => out.push_str("None"),
        Expr::Name(n) => out.push_str(n),
        Expr::Attribute { base, attr } => {
            push_expr(base, out);
            out.push('.');
            out.push_str(attr);
        }
        Expr::Subscript { base, index } => {
            push_expr(base, out);
            out.push('[');
            out.push_str(index);
            out.push(']');
        }
        Expr::Tuple(elems) => {
            out.push('(');
            for (i, el) in elems.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                push_expr(el, out);
            }
            if elems.len() == 1 {
                out.push(',');
            }
            out.push(')');
        }
        Expr::List(elems) => {
            out.push('[');
            for (i, el) in elems.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                push_expr(el, out);
            }
            out.push(']');
        }
        Expr::Dict(pairs) => {
            out.push('{');
            for (i, (k, v)) in pairs.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                push_expr(k, out);
                out.push_str(": ");
                push_expr(v, out);
            }
            out.push('}');
        }
        Expr::Call { func, args, kwargs } => {
            push_expr(func, out);
            out.push('(');
            let mut first = true;
            for a in args {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                push_expr(a, out);
            }
            for (name, v) in kwargs {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                out.push_str(name);
                out.push('=');
                push_expr(v, out);
            }
            out.push(')');
        }
        Expr::Verbatim(text) => out.push_str(text),
    }
}

// repr of a float: integral values keep a trailing ".0"
pub fn float_repr(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

// repr of a string: single quotes unless the content itself holds a single
// quote and no double quote
pub fn str_repr(s: &str) -> String {
    let q = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(q);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(q);
    out
}
