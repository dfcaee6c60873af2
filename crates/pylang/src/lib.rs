pub mod ast;
pub mod lex;
pub mod parse;
pub mod render;

pub use ast::*;
pub use parse::{parse_expr_text, parse_module};
pub use render::{render_expr, render_module, render_stmt_line};
