// Source model for the supported Python subset. Statements keep the exact
// source text they were parsed from; anything outside the subset degrades to
// a verbatim node instead of failing, so parsing is total.

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    NoneLit,
    Name(String),
    Attribute {
        base: Box<Expr>,
        attr: String,
    },
    Subscript {
        base: Box<Expr>,
        // raw text between the brackets, never interpreted
        index: String,
    },
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    // any span the subset grammar does not model, byte-equal to the source
    Verbatim(String),
}

impl Expr {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Int(_) => "int literal",
            Expr::Float(_) => "float literal",
            Expr::Str(_) => "string literal",
            Expr::Bool(_) => "bool literal",
            Expr::NoneLit => "None constant",
            Expr::Name(_) => "name",
            Expr::Attribute { .. } => "attribute access",
            Expr::Subscript { .. } => "subscript",
            Expr::Tuple(_) => "tuple literal",
            Expr::List(_) => "list literal",
            Expr::Dict(_) => "dict literal",
            Expr::Call { .. } => "call",
            Expr::Verbatim(_) => "unsupported expression",
        }
    }

    pub fn is_call_to(&self, name: &str) -> bool {
        match self {
            Expr::Call { func, .. } => matches!(&**func, Expr::Name(n) if n == name),
            _ => false,
        }
    }

    pub fn call_name(&self) -> Option<&str> {
        match self {
            Expr::Call { func, .. } => match &**func {
                Expr::Name(n) => Some(n),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnParam {
    pub name: String,
    // annotation source text, never rewritten
    pub ann: Option<String>,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign {
        // left-hand text as written; may be a dotted or tuple target
        target: String,
        value: Expr,
        raw: String,
        indent: usize,
        line: usize,
    },
    AnnAssign {
        target: String,
        ann: String,
        value: Expr,
        raw: String,
        indent: usize,
        line: usize,
    },
    FunctionDef {
        name: String,
        params: Vec<FnParam>,
        // header text after the closing paren, including the colon
        suffix: String,
        body: Vec<Stmt>,
        raw: String,
        indent: usize,
        line: usize,
    },
    // class / if / for / while / with / try / else ... — any header opening
    // an indented body that the scanner only needs to descend into
    Block {
        body: Vec<Stmt>,
        raw: String,
        indent: usize,
        line: usize,
    },
    ExprStmt {
        value: Expr,
        raw: String,
        indent: usize,
        line: usize,
    },
    Raw {
        text: String,
        line: usize,
    },
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Stmt::Assign { line, .. }
            | Stmt::AnnAssign { line, .. }
            | Stmt::FunctionDef { line, .. }
            | Stmt::Block { line, .. }
            | Stmt::ExprStmt { line, .. }
            | Stmt::Raw { line, .. } => *line,
        }
    }

    pub fn raw_text(&self) -> &str {
        match self {
            Stmt::Assign { raw, .. }
            | Stmt::AnnAssign { raw, .. }
            | Stmt::FunctionDef { raw, .. }
            | Stmt::Block { raw, .. }
            | Stmt::ExprStmt { raw, .. } => raw,
            Stmt::Raw { text, .. } => text,
        }
    }

    pub fn body(&self) -> Option<&[Stmt]> {
        match self {
            Stmt::FunctionDef { body, .. } | Stmt::Block { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn body_mut(&mut self) -> Option<&mut Vec<Stmt>> {
        match self {
            Stmt::FunctionDef { body, .. } | Stmt::Block { body, .. } => Some(body),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub body: Vec<Stmt>,
    pub trailing_newline: bool,
}
