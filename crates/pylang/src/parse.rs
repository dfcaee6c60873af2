// Total parser: every input produces a Module, and anything outside the
// modeled subset is kept as Raw statements or Verbatim expressions whose
// text round-trips byte-for-byte.

use crate::ast::{Expr, FnParam, Module, Stmt};
use crate::lex::{self, ETok, LogicalLine, Spanned};

pub fn parse_module(src: &str) -> Module {
    let lines = lex::logical_lines(src);
    let mut pos = 0;
    let body = parse_block(&lines, &mut pos, 0);
    Module {
        body,
        trailing_newline: src.ends_with('\n'),
    }
}

fn parse_block(lines: &[LogicalLine], pos: &mut usize, indent: usize) -> Vec<Stmt> {
    let mut out = Vec::new();
    while *pos < lines.len() {
        let ll = &lines[*pos];
        if ll.blank {
            out.push(Stmt::Raw {
                text: ll.text.clone(),
                line: ll.line,
            });
            *pos += 1;
            continue;
        }
        if ll.indent < indent {
            break;
        }
        if ll.indent > indent {
            // stray over-indented line; keep it verbatim at this level
            out.push(Stmt::Raw {
                text: ll.text.clone(),
                line: ll.line,
            });
            *pos += 1;
            continue;
        }
        *pos += 1;
        out.push(parse_stmt(lines, pos, ll));
    }
    out
}

// keywords that open an indented suite with a ':' header
const SUITE_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "for", "while", "with", "try", "except", "finally", "class", "async",
];

// statement keywords that never carry a declaration
const PLAIN_KEYWORDS: &[&str] = &[
    "return",
    "yield",
    "raise",
    "assert",
    "del",
    "pass",
    "break",
    "continue",
    "import",
    "from",
    "global",
    "nonlocal",
];

fn leading_word(head: &str) -> &str {
    let end = head
        .bytes()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == b'_')
        .count();
    &head[..end]
}

fn header_opens_suite(text: &str) -> bool {
    let last = text.rsplit('\n').next().unwrap_or(text);
    lex::strip_comment(last).trim_end().ends_with(':')
}

fn parse_stmt(lines: &[LogicalLine], pos: &mut usize, ll: &LogicalLine) -> Stmt {
    let text = &ll.text;
    let head = text.trim_start();
    let word = leading_word(head);

    let raw = |line: usize| Stmt::Raw {
        text: text.clone(),
        line,
    };

    if word == "def" {
        if let Some(stmt) = try_parse_def(lines, pos, ll) {
            return stmt;
        }
        return raw(ll.line);
    }
    if SUITE_KEYWORDS.contains(&word) {
        if header_opens_suite(text) {
            if let Some(body) = parse_suite(lines, pos, ll.indent) {
                return Stmt::Block {
                    body,
                    raw: text.clone(),
                    indent: ll.indent,
                    line: ll.line,
                };
            }
        }
        return raw(ll.line);
    }
    if PLAIN_KEYWORDS.contains(&word) {
        return raw(ll.line);
    }
    // "match"/"case" are soft keywords; only a ':' header makes them suites
    if (word == "match" || word == "case") && header_opens_suite(text) {
        if let Some(body) = parse_suite(lines, pos, ll.indent) {
            return Stmt::Block {
                body,
                raw: text.clone(),
                indent: ll.indent,
                line: ll.line,
            };
        }
        return raw(ll.line);
    }

    let eqs = lex::bare_eq_positions(text);
    match eqs.len() {
        1 => {
            let eq = eqs[0];
            let lhs = text[..eq].trim();
            if lhs.is_empty() {
                return raw(ll.line);
            }
            let value = parse_expr_text(&text[eq + 1..]);
            match lex::top_level_colon(lhs) {
                Some(c) => {
                    let target = lhs[..c].trim();
                    let ann = lhs[c + 1..].trim();
                    if target.is_empty() || ann.is_empty() {
                        return raw(ll.line);
                    }
                    Stmt::AnnAssign {
                        target: target.to_string(),
                        ann: ann.to_string(),
                        value,
                        raw: text.clone(),
                        indent: ll.indent,
                        line: ll.line,
                    }
                }
                None => Stmt::Assign {
                    target: lhs.to_string(),
                    value,
                    raw: text.clone(),
                    indent: ll.indent,
                    line: ll.line,
                },
            }
        }
        0 => {
            if header_opens_suite(text) {
                if let Some(body) = parse_suite(lines, pos, ll.indent) {
                    return Stmt::Block {
                        body,
                        raw: text.clone(),
                        indent: ll.indent,
                        line: ll.line,
                    };
                }
            }
            let value = parse_expr_text(text);
            if matches!(value, Expr::Call { .. }) {
                Stmt::ExprStmt {
                    value,
                    raw: text.clone(),
                    indent: ll.indent,
                    line: ll.line,
                }
            } else {
                raw(ll.line)
            }
        }
        _ => raw(ll.line),
    }
}

// body of a ':' header: the following non-blank lines, which must sit at a
// deeper indent than the header itself
fn parse_suite(lines: &[LogicalLine], pos: &mut usize, parent_indent: usize) -> Option<Vec<Stmt>> {
    let mut j = *pos;
    while j < lines.len() && lines[j].blank {
        j += 1;
    }
    if j >= lines.len() || lines[j].indent <= parent_indent {
        return None;
    }
    let body_indent = lines[j].indent;
    Some(parse_block(lines, pos, body_indent))
}

fn try_parse_def(lines: &[LogicalLine], pos: &mut usize, ll: &LogicalLine) -> Option<Stmt> {
    let text = &ll.text;
    let after = &text[ll.indent + 3..];
    let ws = after.len() - after.trim_start().len();
    if ws == 0 {
        return None;
    }
    let rest = &after[ws..];
    let name_len = rest
        .bytes()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == b'_')
        .count();
    if name_len == 0 {
        return None;
    }
    let name = &rest[..name_len];
    let t = rest[name_len..].trim_start();
    if !t.starts_with('(') {
        return None;
    }
    let open = text.len() - t.len();
    let close = lex::matching_close(text, open)?;
    let params_text = &text[open + 1..close];
    let suffix = &text[close + 1..];
    if suffix.contains('\n') || !lex::strip_comment(suffix).trim_end().ends_with(':') {
        return None;
    }
    let params = parse_fn_params(params_text)?;
    let body = parse_suite(lines, pos, ll.indent)?;
    Some(Stmt::FunctionDef {
        name: name.to_string(),
        params,
        suffix: suffix.to_string(),
        body,
        raw: text.clone(),
        indent: ll.indent,
        line: ll.line,
    })
}

fn parse_fn_params(text: &str) -> Option<Vec<FnParam>> {
    let mut segs: Vec<&str> = Vec::new();
    let mut lo = 0;
    for c in lex::top_level_commas(text) {
        segs.push(&text[lo..c]);
        lo = c + 1;
    }
    segs.push(&text[lo..]);
    let mut out = Vec::new();
    for (k, seg) in segs.iter().enumerate() {
        let t = seg.trim();
        if t.is_empty() {
            if k + 1 == segs.len() {
                continue;
            }
            return None;
        }
        out.push(parse_fn_param(t)?);
    }
    Some(out)
}

fn parse_fn_param(t: &str) -> Option<FnParam> {
    let eqs = lex::bare_eq_positions(t);
    let colon = lex::top_level_colon(t);
    let (name, ann, default) = match (colon, eqs.first().copied()) {
        // annotation sits before the default; a ':' after '=' belongs to the
        // default expression (a lambda, a dict)
        (Some(c), Some(e)) if c < e => (&t[..c], Some(&t[c + 1..e]), Some(&t[e + 1..])),
        (_, Some(e)) => (&t[..e], None, Some(&t[e + 1..])),
        (Some(c), None) => (&t[..c], Some(&t[c + 1..]), None),
        (None, None) => (t, None, None),
    };
    let name = name.trim();
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '*' || c == '/')
    {
        return None;
    }
    let ann = match ann {
        Some(a) => {
            let a = a.trim();
            if a.is_empty() {
                return None;
            }
            Some(a.to_string())
        }
        None => None,
    };
    Some(FnParam {
        name: name.to_string(),
        ann,
        default: default.map(parse_expr_text),
    })
}

pub fn parse_expr_text(text: &str) -> Expr {
    let t = text.trim();
    if t.is_empty() {
        return Expr::Verbatim(String::new());
    }
    let toks = lex::tokenize_expr(t);
    if toks.is_empty() {
        return Expr::Verbatim(t.to_string());
    }
    let mut p = Parser {
        src: t,
        toks: &toks,
        i: 0,
    };
    match p.expr() {
        Some(e) if p.i == toks.len() => e,
        _ => Expr::Verbatim(t.to_string()),
    }
}

struct Parser<'a> {
    src: &'a str,
    toks: &'a [Spanned],
    i: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a ETok> {
        self.toks.get(self.i).map(|s| &s.tok)
    }

    fn tok_at(&self, k: usize) -> Option<&'a ETok> {
        self.toks.get(k).map(|s| &s.tok)
    }

    fn expr(&mut self) -> Option<Expr> {
        let a = self.atom()?;
        self.postfix(a)
    }

    fn atom(&mut self) -> Option<Expr> {
        match self.peek()? {
            ETok::Int(v) => {
                self.i += 1;
                Some(Expr::Int(*v))
            }
            ETok::Float(v) => {
                self.i += 1;
                Some(Expr::Float(*v))
            }
            ETok::Str(s) => {
                // adjacent literals concatenate
                let mut acc = s.clone();
                self.i += 1;
                while let Some(ETok::Str(more)) = self.peek() {
                    acc.push_str(more);
                    self.i += 1;
                }
                Some(Expr::Str(acc))
            }
            ETok::Minus => match self.tok_at(self.i + 1) {
                Some(ETok::Int(v)) => {
                    self.i += 2;
                    Some(Expr::Int(-v))
                }
                Some(ETok::Float(v)) => {
                    self.i += 2;
                    Some(Expr::Float(-v))
                }
                _ => None,
            },
            ETok::Ident(w) => {
                self.i += 1;
                match w.as_str() {
                    "True" => Some(Expr::Bool(true)),
                    "False" => Some(Expr::Bool(false)),
                    "None" => Some(Expr::NoneLit),
                    _ => Some(Expr::Name(w.clone())),
                }
            }
            ETok::LParen => self.parens(),
            ETok::LBrack => self.list(),
            ETok::LBrace => self.dict(),
            _ => None,
        }
    }

    fn postfix(&mut self, mut e: Expr) -> Option<Expr> {
        loop {
            match self.peek() {
                Some(ETok::Dot) => {
                    let Some(ETok::Ident(name)) = self.tok_at(self.i + 1) else {
                        return None;
                    };
                    e = Expr::Attribute {
                        base: Box::new(e),
                        attr: name.clone(),
                    };
                    self.i += 2;
                }
                Some(ETok::LParen) => {
                    let close = self.matching(self.i)?;
                    let (args, kwargs) = self.call_args(self.i + 1, close)?;
                    e = Expr::Call {
                        func: Box::new(e),
                        args,
                        kwargs,
                    };
                    self.i = close + 1;
                }
                Some(ETok::LBrack) => {
                    let close = self.matching(self.i)?;
                    let index = self.src[self.toks[self.i].hi..self.toks[close].lo]
                        .trim()
                        .to_string();
                    e = Expr::Subscript {
                        base: Box::new(e),
                        index,
                    };
                    self.i = close + 1;
                }
                _ => break,
            }
        }
        Some(e)
    }

    fn matching(&self, open: usize) -> Option<usize> {
        let want = match self.toks[open].tok {
            ETok::LParen => ETok::RParen,
            ETok::LBrack => ETok::RBrack,
            _ => ETok::RBrace,
        };
        let mut depth = 0i64;
        for (k, s) in self.toks.iter().enumerate().skip(open) {
            match s.tok {
                ETok::LParen | ETok::LBrack | ETok::LBrace => depth += 1,
                ETok::RParen | ETok::RBrack | ETok::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return if s.tok == want { Some(k) } else { None };
                    }
                }
                _ => {}
            }
        }
        None
    }

    // comma-separated token ranges inside a bracket pair
    fn segments(&self, lo: usize, hi: usize) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        let mut depth = 0i64;
        let mut start = lo;
        for k in lo..hi {
            match self.toks[k].tok {
                ETok::LParen | ETok::LBrack | ETok::LBrace => depth += 1,
                ETok::RParen | ETok::RBrack | ETok::RBrace => depth -= 1,
                ETok::Comma if depth == 0 => {
                    out.push((start, k));
                    start = k + 1;
                }
                _ => {}
            }
        }
        out.push((start, hi));
        out
    }

    fn sub_expr(&self, a: usize, b: usize) -> Expr {
        if a >= b {
            return Expr::Verbatim(String::new());
        }
        let slice = &self.toks[a..b];
        let mut p = Parser {
            src: self.src,
            toks: slice,
            i: 0,
        };
        match p.expr() {
            Some(e) if p.i == slice.len() => e,
            _ => Expr::Verbatim(self.src[slice[0].lo..slice[slice.len() - 1].hi].to_string()),
        }
    }

    fn call_args(&self, lo: usize, hi: usize) -> Option<(Vec<Expr>, Vec<(String, Expr)>)> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        let segs = self.segments(lo, hi);
        for (n, (a, b)) in segs.iter().copied().enumerate() {
            if a == b {
                if n + 1 == segs.len() {
                    continue;
                }
                return None;
            }
            if b - a >= 2 {
                if let (ETok::Ident(name), ETok::Eq) = (&self.toks[a].tok, &self.toks[a + 1].tok) {
                    kwargs.push((name.clone(), self.sub_expr(a + 2, b)));
                    continue;
                }
            }
            args.push(self.sub_expr(a, b));
        }
        Some((args, kwargs))
    }

    fn parens(&mut self) -> Option<Expr> {
        let open = self.i;
        let close = self.matching(open)?;
        let lo = open + 1;
        let segs = self.segments(lo, close);
        let trailing_comma = close > lo && matches!(self.toks[close - 1].tok, ETok::Comma);
        let result = if segs.len() == 1 && segs[0].0 == segs[0].1 {
            Expr::Tuple(Vec::new())
        } else if segs.len() == 1 && !trailing_comma {
            // grouping parens, not a tuple
            match self.sub_expr(segs[0].0, segs[0].1) {
                Expr::Verbatim(_) => {
                    // keep the parens on text we could not model
                    Expr::Verbatim(
                        self.src[self.toks[open].lo..self.toks[close].hi].to_string(),
                    )
                }
                e => e,
            }
        } else {
            let mut elems = Vec::new();
            for (n, (a, b)) in segs.iter().copied().enumerate() {
                if a == b {
                    if n + 1 == segs.len() {
                        continue;
                    }
                    return None;
                }
                elems.push(self.sub_expr(a, b));
            }
            Expr::Tuple(elems)
        };
        self.i = close + 1;
        Some(result)
    }

    fn list(&mut self) -> Option<Expr> {
        let close = self.matching(self.i)?;
        let segs = self.segments(self.i + 1, close);
        let mut elems = Vec::new();
        for (n, (a, b)) in segs.iter().copied().enumerate() {
            if a == b {
                if n + 1 == segs.len() {
                    continue;
                }
                return None;
            }
            elems.push(self.sub_expr(a, b));
        }
        self.i = close + 1;
        Some(Expr::List(elems))
    }

    fn dict(&mut self) -> Option<Expr> {
        let close = self.matching(self.i)?;
        let segs = self.segments(self.i + 1, close);
        let mut pairs = Vec::new();
        for (n, (a, b)) in segs.iter().copied().enumerate() {
            if a == b {
                if n + 1 == segs.len() {
                    continue;
                }
                return None;
            }
            // a segment with no top-level ':' is a set display; not modeled
            let colon = self.seg_colon(a, b)?;
            pairs.push((self.sub_expr(a, colon), self.sub_expr(colon + 1, b)));
        }
        self.i = close + 1;
        Some(Expr::Dict(pairs))
    }

    fn seg_colon(&self, a: usize, b: usize) -> Option<usize> {
        let mut depth = 0i64;
        for k in a..b {
            match self.toks[k].tok {
                ETok::LParen | ETok::LBrack | ETok::LBrace => depth += 1,
                ETok::RParen | ETok::RBrack | ETok::RBrace => depth -= 1,
                ETok::Colon if depth == 0 => return Some(k),
                _ => {}
            }
        }
        None
    }
}
