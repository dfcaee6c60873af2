// Two lexing layers: a logical-line splitter that groups physical lines the
// way the host language's tokenizer does (bracket continuation, backslash
// continuation, triple-quoted strings), and an expression tokenizer used by
// the recursive-descent expression parser. Both are total: unrecognized
// input degrades to opaque tokens instead of failing.

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    // physical lines joined with '\n', byte-equal to the source slice
    pub text: String,
    // 1-based first physical line
    pub line: usize,
    pub indent: usize,
    pub blank: bool,
}

#[derive(Default)]
struct LineState {
    depth: i64,
    triple: Option<u8>,
    backslash: bool,
}

fn advance_line_state(line: &str, st: &mut LineState) {
    let b = line.as_bytes();
    let mut i = 0;
    st.backslash = false;
    while i < b.len() {
        if let Some(q) = st.triple {
            if b[i] == b'\\' {
                i += 2;
            } else if b[i] == q && b.get(i + 1) == Some(&q) && b.get(i + 2) == Some(&q) {
                st.triple = None;
                i += 3;
            } else {
                i += 1;
            }
            continue;
        }
        match b[i] {
            b'#' => return,
            q @ (b'\'' | b'"') => {
                if b.get(i + 1) == Some(&q) && b.get(i + 2) == Some(&q) {
                    st.triple = Some(q);
                    i += 3;
                } else {
                    i += 1;
                    while i < b.len() {
                        if b[i] == b'\\' {
                            i += 2;
                        } else if b[i] == q {
                            i += 1;
                            break;
                        } else {
                            i += 1;
                        }
                    }
                }
            }
            b'(' | b'[' | b'{' => {
                st.depth += 1;
                i += 1;
            }
            b')' | b']' | b'}' => {
                if st.depth > 0 {
                    st.depth -= 1;
                }
                i += 1;
            }
            b'\\' if i + 1 == b.len() => {
                st.backslash = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
}

pub fn logical_lines(src: &str) -> Vec<LogicalLine> {
    let mut lines: Vec<&str> = src.split('\n').collect();
    if src.ends_with('\n') {
        lines.pop();
    }
    let mut out = Vec::new();
    let mut idx = 0;
    while idx < lines.len() {
        let start = idx;
        let mut st = LineState::default();
        advance_line_state(lines[idx], &mut st);
        idx += 1;
        while (st.depth > 0 || st.triple.is_some() || st.backslash) && idx < lines.len() {
            advance_line_state(lines[idx], &mut st);
            idx += 1;
        }
        let text = lines[start..idx].join("\n");
        let head = lines[start];
        let indent = head.len() - head.trim_start().len();
        let t = text.trim();
        let blank = t.is_empty() || t.starts_with('#');
        out.push(LogicalLine {
            text,
            line: start + 1,
            indent,
            blank,
        });
    }
    out
}

// Walks `text` outside strings, comments and brackets, reporting each
// top-level byte position. Stops early when the callback returns false.
fn scan_top_level(text: &str, mut f: impl FnMut(usize, u8) -> bool) {
    let b = text.as_bytes();
    let mut i = 0;
    let mut depth: i64 = 0;
    while i < b.len() {
        match b[i] {
            b'#' => {
                while i < b.len() && b[i] != b'\n' {
                    i += 1;
                }
            }
            q @ (b'\'' | b'"') => {
                if b.get(i + 1) == Some(&q) && b.get(i + 2) == Some(&q) {
                    i += 3;
                    while i < b.len() {
                        if b[i] == b'\\' {
                            i += 2;
                        } else if b[i] == q
                            && b.get(i + 1) == Some(&q)
                            && b.get(i + 2) == Some(&q)
                        {
                            i += 3;
                            break;
                        } else {
                            i += 1;
                        }
                    }
                } else {
                    i += 1;
                    while i < b.len() {
                        if b[i] == b'\\' {
                            i += 2;
                        } else if b[i] == q || b[i] == b'\n' {
                            i += 1;
                            break;
                        } else {
                            i += 1;
                        }
                    }
                }
            }
            b'(' | b'[' | b'{' => {
                depth += 1;
                i += 1;
            }
            b')' | b']' | b'}' => {
                if depth > 0 {
                    depth -= 1;
                }
                i += 1;
            }
            c => {
                if depth == 0 && !f(i, c) {
                    return;
                }
                i += 1;
            }
        }
    }
}

// byte index of the bracket matching the opener at `open`, honoring
// strings and comments
pub fn matching_close(text: &str, open: usize) -> Option<usize> {
    let b = text.as_bytes();
    let mut i = open;
    let mut depth: i64 = 0;
    while i < b.len() {
        match b[i] {
            b'#' => {
                while i < b.len() && b[i] != b'\n' {
                    i += 1;
                }
            }
            q @ (b'\'' | b'"') => {
                i += 1;
                let triple = b.get(i) == Some(&q) && b.get(i + 1) == Some(&q);
                if triple {
                    i += 2;
                }
                while i < b.len() {
                    if b[i] == b'\\' {
                        i += 2;
                    } else if triple {
                        if b[i] == q && b.get(i + 1) == Some(&q) && b.get(i + 2) == Some(&q) {
                            i += 3;
                            break;
                        }
                        i += 1;
                    } else if b[i] == q || b[i] == b'\n' {
                        i += 1;
                        break;
                    } else {
                        i += 1;
                    }
                }
            }
            b'(' | b'[' | b'{' => {
                depth += 1;
                i += 1;
            }
            b')' | b']' | b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}

// slice of `line` before any trailing comment
pub fn strip_comment(line: &str) -> &str {
    let mut end = line.len();
    scan_top_level(line, |i, c| {
        if c == b'#' {
            end = i;
            return false;
        }
        true
    });
    // '#' inside brackets still starts a comment; scan_top_level only
    // reports top-level bytes, so fall back to a raw check for that case
    if end == line.len() {
        if let Some(pos) = find_comment_any_depth(line) {
            end = pos;
        }
    }
    &line[..end]
}

fn find_comment_any_depth(line: &str) -> Option<usize> {
    let b = line.as_bytes();
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'#' => return Some(i),
            q @ (b'\'' | b'"') => {
                i += 1;
                while i < b.len() {
                    if b[i] == b'\\' {
                        i += 2;
                    } else if b[i] == q {
                        i += 1;
                        break;
                    } else {
                        i += 1;
                    }
                }
            }
            _ => i += 1,
        }
    }
    None
}

pub fn top_level_commas(text: &str) -> Vec<usize> {
    let mut out = Vec::new();
    scan_top_level(text, |i, c| {
        if c == b',' {
            out.push(i);
        }
        true
    });
    out
}

pub fn top_level_colon(text: &str) -> Option<usize> {
    let mut found = None;
    scan_top_level(text, |i, c| {
        if c == b':' && text.as_bytes().get(i + 1) != Some(&b'=') {
            found = Some(i);
            return false;
        }
        true
    });
    found
}

// positions of plain assignment '=' signs: not part of ==, !=, <=, >=,
// augmented assignment, arrow, or walrus
pub fn bare_eq_positions(text: &str) -> Vec<usize> {
    let b = text.as_bytes();
    let mut out = Vec::new();
    scan_top_level(text, |i, c| {
        if c == b'=' {
            let prev = if i == 0 { b' ' } else { b[i - 1] };
            let next = b.get(i + 1).copied().unwrap_or(b' ');
            let op_prev = matches!(
                prev,
                b'=' | b'!' | b'<' | b'>' | b'+' | b'-' | b'*' | b'/' | b'%' | b'@' | b'&'
                    | b'|' | b'^' | b':' | b'~'
            );
            if !op_prev && next != b'=' {
                out.push(i);
            }
        }
        true
    });
    out
}

// ---------------------------------------------------------------------------
// expression tokens

#[derive(Debug, Clone, PartialEq)]
pub enum ETok {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Eq,
    Minus,
    // any operator the expression subset does not model; forces fallback
    Op(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub tok: ETok,
    pub lo: usize,
    pub hi: usize,
}

struct ExprLexer<'a> {
    s: &'a [u8],
    i: usize,
}

impl<'a> ExprLexer<'a> {
    fn peek(&self) -> Option<u8> {
        self.s.get(self.i).copied()
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
                self.i += 1;
            }
            if self.peek() == Some(b'\\') && self.s.get(self.i + 1) == Some(&b'\n') {
                self.i += 2;
                continue;
            }
            if self.peek() == Some(b'#') {
                while let Some(b) = self.peek() {
                    if b == b'\n' {
                        break;
                    }
                    self.i += 1;
                }
                continue;
            }
            break;
        }
    }

    fn lex_number(&mut self) -> ETok {
        let lo = self.i;
        let b = self.s;
        if b[self.i] == b'0' && matches!(b.get(self.i + 1), Some(b'x' | b'X' | b'o' | b'O' | b'b' | b'B')) {
            let radix = match b[self.i + 1] {
                b'x' | b'X' => 16,
                b'o' | b'O' => 8,
                _ => 2,
            };
            self.i += 2;
            while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
                self.i += 1;
            }
            let digits: String = std::str::from_utf8(&b[lo + 2..self.i])
                .unwrap_or("")
                .chars()
                .filter(|c| *c != '_')
                .collect();
            return match i64::from_str_radix(&digits, radix) {
                Ok(v) => ETok::Int(v),
                Err(_) => ETok::Op(String::from_utf8_lossy(&b[lo..self.i]).into_owned()),
            };
        }
        let mut is_float = false;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == b'_') {
            self.i += 1;
        }
        if self.peek() == Some(b'.') && matches!(self.s.get(self.i + 1), Some(c) if c.is_ascii_digit()) {
            is_float = true;
            self.i += 1;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == b'_') {
                self.i += 1;
            }
        } else if self.peek() == Some(b'.') && !matches!(self.s.get(self.i + 1), Some(c) if c.is_ascii_alphabetic() || *c == b'_')
        {
            // trailing-dot float like "15."
            is_float = true;
            self.i += 1;
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mut j = self.i + 1;
            if matches!(self.s.get(j), Some(b'+' | b'-')) {
                j += 1;
            }
            if matches!(self.s.get(j), Some(c) if c.is_ascii_digit()) {
                is_float = true;
                self.i = j;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == b'_') {
                    self.i += 1;
                }
            }
        }
        let text: String = String::from_utf8_lossy(&b[lo..self.i])
            .chars()
            .filter(|c| *c != '_')
            .collect();
        if is_float {
            match text.parse::<f64>() {
                Ok(v) => ETok::Float(v),
                Err(_) => ETok::Op(text),
            }
        } else {
            match text.parse::<i64>() {
                Ok(v) => ETok::Int(v),
                Err(_) => ETok::Op(text),
            }
        }
    }

    // consumes a quoted literal starting at self.i and returns the decoded
    // content; an unterminated literal yields everything up to the line end
    fn lex_string(&mut self, raw: bool) -> String {
        let b = self.s;
        let q = b[self.i];
        let triple = b.get(self.i + 1) == Some(&q) && b.get(self.i + 2) == Some(&q);
        self.i += if triple { 3 } else { 1 };
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == b'\\' && !raw {
                let esc = self.s.get(self.i + 1).copied();
                self.i += 2;
                match esc {
                    Some(b'n') => out.push('\n'),
                    Some(b't') => out.push('\t'),
                    Some(b'r') => out.push('\r'),
                    Some(b'0') => out.push('\0'),
                    Some(b'\\') => out.push('\\'),
                    Some(b'\'') => out.push('\''),
                    Some(b'"') => out.push('"'),
                    Some(b'\n') => {}
                    Some(b'x') => {
                        let h1 = self.s.get(self.i).copied();
                        let h2 = self.s.get(self.i + 1).copied();
                        match (h1, h2) {
                            (Some(h1), Some(h2))
                                if h1.is_ascii_hexdigit() && h2.is_ascii_hexdigit() =>
                            {
                                let v = (hex_val(h1) << 4) | hex_val(h2);
                                out.push(v as char);
                                self.i += 2;
                            }
                            _ => out.push_str("\\x"),
                        }
                    }
                    Some(other) => {
                        out.push('\\');
                        out.push(other as char);
                    }
                    None => out.push('\\'),
                }
                continue;
            }
            if c == b'\\' && raw {
                out.push('\\');
                if let Some(n) = self.s.get(self.i + 1) {
                    out.push(*n as char);
                }
                self.i += 2;
                continue;
            }
            if triple {
                if c == q && b.get(self.i + 1) == Some(&q) && b.get(self.i + 2) == Some(&q) {
                    self.i += 3;
                    return out;
                }
            } else if c == q {
                self.i += 1;
                return out;
            } else if c == b'\n' {
                self.i += 1;
                return out;
            }
            // multi-byte chars pass through untouched
            let start = self.i;
            self.i += 1;
            while self.i < b.len() && (b[self.i] & 0xC0) == 0x80 {
                self.i += 1;
            }
            out.push_str(&String::from_utf8_lossy(&b[start..self.i]));
        }
        out
    }
}

fn hex_val(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        _ => c - b'A' + 10,
    }
}

pub fn tokenize_expr(text: &str) -> Vec<Spanned> {
    let mut lx = ExprLexer {
        s: text.as_bytes(),
        i: 0,
    };
    let mut out = Vec::new();
    loop {
        lx.skip_ws_and_comments();
        let lo = lx.i;
        let Some(c) = lx.peek() else { break };
        let tok = match c {
            b'(' => {
                lx.i += 1;
                ETok::LParen
            }
            b')' => {
                lx.i += 1;
                ETok::RParen
            }
            b'[' => {
                lx.i += 1;
                ETok::LBrack
            }
            b']' => {
                lx.i += 1;
                ETok::RBrack
            }
            b'{' => {
                lx.i += 1;
                ETok::LBrace
            }
            b'}' => {
                lx.i += 1;
                ETok::RBrace
            }
            b',' => {
                lx.i += 1;
                ETok::Comma
            }
            b'.' => {
                if matches!(lx.s.get(lx.i + 1), Some(d) if d.is_ascii_digit()) {
                    lx.lex_number()
                } else {
                    lx.i += 1;
                    ETok::Dot
                }
            }
            b':' => {
                if lx.s.get(lx.i + 1) == Some(&b'=') {
                    lx.i += 2;
                    ETok::Op(":=".into())
                } else {
                    lx.i += 1;
                    ETok::Colon
                }
            }
            b'=' => {
                if lx.s.get(lx.i + 1) == Some(&b'=') {
                    lx.i += 2;
                    ETok::Op("==".into())
                } else {
                    lx.i += 1;
                    ETok::Eq
                }
            }
            b'-' => {
                if lx.s.get(lx.i + 1) == Some(&b'>') {
                    lx.i += 2;
                    ETok::Op("->".into())
                } else {
                    lx.i += 1;
                    ETok::Minus
                }
            }
            b'\'' | b'"' => ETok::Str(lx.lex_string(false)),
            c if c.is_ascii_digit() => lx.lex_number(),
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let start = lx.i;
                while matches!(lx.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
                    lx.i += 1;
                }
                let word = String::from_utf8_lossy(&lx.s[start..lx.i]).into_owned();
                if matches!(lx.peek(), Some(b'\'' | b'"')) && word.len() <= 2 {
                    let low = word.to_ascii_lowercase();
                    if low.chars().all(|c| matches!(c, 'r' | 'b' | 'u' | 'f')) {
                        if low.contains('b') || low.contains('f') {
                            // bytes / formatted literals stay opaque
                            let _ = lx.lex_string(true);
                            ETok::Op(String::from_utf8_lossy(&lx.s[start..lx.i]).into_owned())
                        } else {
                            ETok::Str(lx.lex_string(low.contains('r')))
                        }
                    } else {
                        ETok::Ident(word)
                    }
                } else {
                    ETok::Ident(word)
                }
            }
            _ => {
                let start = lx.i;
                lx.i += 1;
                // greedy operator run keeps things like ** and // together
                while matches!(
                    lx.peek(),
                    Some(b'*' | b'/' | b'<' | b'>' | b'!' | b'&' | b'|' | b'^' | b'%' | b'@' | b'+' | b'~' | b'=')
                ) && matches!(
                    lx.s[lx.i - 1],
                    b'*' | b'/' | b'<' | b'>' | b'!' | b'&' | b'|' | b'^' | b'%' | b'@' | b'+' | b'~'
                ) {
                    lx.i += 1;
                }
                ETok::Op(String::from_utf8_lossy(&lx.s[start..lx.i]).into_owned())
            }
        };
        out.push(Spanned {
            tok,
            lo,
            hi: lx.i,
        });
    }
    out
}
