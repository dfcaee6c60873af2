//! Source composition: module derivation, textual inclusion, encapsulation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use paramcore::{reconcile, EventLog, ModuleInclude, ParamError, ParamValue, Result, Stage};
use pylang::{parse_module, render_module, Expr, Stmt};
use regex::Regex;

use crate::codec;
use crate::compile;
use crate::lookup;
use crate::markers::MarkerConfig;
use crate::rewrite;
use crate::scan::{self, DirectiveSite};

/// Composes one unit into a single self-contained source: derivation first,
/// then the runtime import line, textual inclusion, and module
/// encapsulation. The result carries no directive markers.
pub fn compose_source(
    source: &str,
    search_folders: &[PathBuf],
    markers: &MarkerConfig,
    events: &mut EventLog,
) -> Result<String> {
    let mut stack: Vec<String> = Vec::new();
    let source = derive_unit(source, search_folders, markers, &mut stack, events)?;
    let source = format!("{}\n{}", markers.runtime_import, source);
    let source = expand_includes(&source, search_folders, markers, &mut stack, events)?;
    include_modules(&source, search_folders, markers, events)
}

// A unit with a derive directive is a patch: its replace declarations are
// applied over the base unit's includes and the patched base becomes the
// working source. The deriving unit's other content is dropped.
fn derive_unit(
    source: &str,
    search_folders: &[PathBuf],
    markers: &MarkerConfig,
    stack: &mut Vec<String>,
    events: &mut EventLog,
) -> Result<String> {
    if !source.contains(&markers.derive) {
        return Ok(source.to_string());
    }
    let splitter = pattern(r"[()\s]+")?;
    let count = splitter
        .split(source)
        .filter(|t| *t == markers.derive.as_str())
        .count();
    if count != 1 {
        return Err(ParamError::MultipleDeriveDirectives);
    }

    let name_re = pattern(&format!(
        r#".*{}.*\([ "]+(.*)[ "]+\).*"#,
        regex::escape(&markers.derive)
    ))?;
    let mut derive_name: Option<String> = None;
    for line in source.lines() {
        if let Some(caps) = name_re.captures(line) {
            derive_name = Some(caps[1].to_string());
        }
    }
    let name = match derive_name {
        Some(n) => n,
        None => {
            let line = source
                .lines()
                .find(|l| l.contains(&markers.derive))
                .unwrap_or("")
                .to_string();
            return Err(ParamError::MalformedDirective { line });
        }
    };
    events.push(Stage::Derive, &name, "deriving");

    let overrides = include_decls(source, &markers.replace)?;
    if stack.iter().any(|p| p == &name) {
        return Err(ParamError::CyclicInclude {
            path: name,
            stack: stack.clone(),
        });
    }
    stack.push(name.clone());
    let base = lookup::find_unit_source(&name, search_folders)?;
    let base = expand_includes(&base, search_folders, markers, stack, events)?;

    let includes = include_decls(&base, &markers.include)?;
    let mut merged: Vec<ModuleInclude> = Vec::with_capacity(includes.len());
    for inc in includes {
        match overrides.iter().find(|ov| ov.name == inc.name) {
            Some(ov) => {
                events.push(
                    Stage::Derive,
                    &inc.name,
                    format!("{} => {}", inc.path, ov.path),
                );
                merged.push(ov.clone());
            }
            None => merged.push(inc),
        }
    }
    for ov in &overrides {
        if !merged.iter().any(|m| m.name == ov.name) {
            events.push(Stage::Derive, &ov.name, "no matching include, ignoring");
        }
    }

    let patched = update_include_decls(&base, &merged, markers)?;
    let result = derive_unit(&patched, search_folders, markers, stack, events)?;
    stack.pop();
    Ok(result)
}

// Decorator pre-passes run first; afterwards the first remaining directive
// is resolved, its unit recursively expanded, banner-wrapped at the
// directive's column and spliced over the directive line, until none
// remain.
fn expand_includes(
    source: &str,
    search_folders: &[PathBuf],
    markers: &MarkerConfig,
    stack: &mut Vec<String>,
    events: &mut EventLog,
) -> Result<String> {
    let source = apply_source_decorators(source, markers)?;
    let mut source = apply_module_decorators(&source, markers)?;
    if !source.contains(&markers.include_source) {
        return Ok(source);
    }
    loop {
        let module = parse_module(&source);
        let sites = scan::scan_directives(&module, &markers.include_source);
        let site = match sites.into_iter().next() {
            Some(s) => s,
            None => break,
        };
        let path = directive_path(&site)?;
        if stack.iter().any(|p| p == &path) {
            return Err(ParamError::CyclicInclude {
                path,
                stack: stack.clone(),
            });
        }
        events.push(
            Stage::IncludeSource,
            &path,
            format!("splicing at line {}", site.line),
        );
        let unit = lookup::find_unit_source(&path, search_folders)?;
        stack.push(path.clone());
        let unit = expand_includes(&unit, search_folders, markers, stack, events)?;
        stack.pop();
        source = splice_include(&source, &site, &path, &unit);
    }
    Ok(source)
}

// Every include declaration's unit is loaded, rescoped when the declaration
// carries a scope, wrapped in an encapsulation class and emitted ahead of
// the working source, in which the declaration itself becomes a constructor
// call. Included units are not themselves composed.
fn include_modules(
    source: &str,
    search_folders: &[PathBuf],
    markers: &MarkerConfig,
    events: &mut EventLog,
) -> Result<String> {
    let mut module = parse_module(source);
    let sites = scan::scan_params(&module, &markers.include)?;
    let mut includes = Vec::with_capacity(sites.len());
    for site in &sites {
        includes.push(codec::include_from_call(&site.name, &site.call)?);
    }
    if includes.is_empty() {
        return Ok(source.to_string());
    }

    let mut imported = String::new();
    for inc in &includes {
        let unit = lookup::find_unit_source(&inc.path, search_folders)?;
        let unit = if inc.scope.is_empty() {
            unit
        } else {
            let params = compile::extract_params(&unit, markers)?;
            let scoped = reconcile::add_scope(&inc.scope, &params);
            compile::update_source_params(&unit, &scoped, markers)?
        };
        events.push(
            Stage::Encapsulate,
            &inc.name,
            format!("importing `{}`", inc.path),
        );
        imported.push_str(&module_banner(&inc.path, &inc.name));
        imported.push_str(&encapsulate_unit(&inc.name, &unit, markers));
    }
    imported.push_str("\n\"\"\"\n");
    imported.push_str(&"-".repeat(80));
    imported.push_str("\n\"\"\"\n");

    let mut subs: BTreeMap<usize, Expr> = BTreeMap::new();
    for (site, inc) in sites.iter().zip(&includes) {
        let ctor = Expr::Call {
            func: Box::new(Expr::Name(format!("{}{}", markers.class_prefix, inc.name))),
            args: Vec::new(),
            kwargs: Vec::new(),
        };
        subs.insert(site.index, ctor);
    }
    rewrite::apply(&mut module, &sites, &subs)?;
    Ok(format!("{imported}{}", render_module(&module)))
}

fn include_decls(source: &str, marker: &str) -> Result<Vec<ModuleInclude>> {
    let module = parse_module(source);
    let sites = scan::scan_params(&module, marker)?;
    sites
        .iter()
        .map(|s| codec::include_from_call(&s.name, &s.call))
        .collect()
}

// Record-to-record substitution of include declarations, pairing scan order
// with the new list.
fn update_include_decls(
    source: &str,
    new_includes: &[ModuleInclude],
    markers: &MarkerConfig,
) -> Result<String> {
    let mut module = parse_module(source);
    let sites = scan::scan_params(&module, &markers.include)?;
    let mut subs: BTreeMap<usize, Expr> = BTreeMap::new();
    for (site, inc) in sites.iter().zip(new_includes) {
        subs.insert(site.index, codec::encode_include(inc, markers));
    }
    rewrite::apply(&mut module, &sites, &subs)?;
    Ok(render_module(&module))
}

// First positional argument, else the first keyword's value.
fn directive_path(site: &DirectiveSite) -> Result<String> {
    let arg = match &site.call {
        Expr::Call { args, kwargs, .. } => {
            args.first().or_else(|| kwargs.first().map(|(_, v)| v))
        }
        _ => None,
    };
    match arg.map(codec::decode) {
        Some(Ok(ParamValue::Str(s))) => Ok(s),
        _ => Err(ParamError::MalformedDirective {
            line: site.raw.trim().to_string(),
        }),
    }
}

fn splice_include(source: &str, site: &DirectiveSite, path: &str, unit: &str) -> String {
    let banner = banner_lines(site.indent, path, unit);
    let lines: Vec<&str> = source.split('\n').collect();
    let start = site.line - 1;
    let height = site.raw.matches('\n').count() + 1;
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + banner.len());
    out.extend(lines[..start].iter().map(|s| s.to_string()));
    out.extend(banner);
    out.extend(lines[start + height..].iter().map(|s| s.to_string()));
    out.join("\n")
}

// Header and footer are five physical lines each: a quote line, a dash
// rule, the title at twice the directive's column, another rule, a closing
// quote. Body lines all carry the directive's column as a prefix.
fn banner_lines(col: usize, path: &str, unit: &str) -> Vec<String> {
    let s = " ".repeat(col);
    let rule = format!("{s}{}", "-".repeat(80usize.saturating_sub(col)));
    let mut out = vec![
        format!("{s}\"\"\""),
        rule.clone(),
        format!("{s}{s}PyParams: auto include source of `{path}`"),
        rule.clone(),
        format!("{s}\"\"\""),
    ];
    for line in unit.split('\n') {
        out.push(format!("{s}{line}"));
    }
    out.push(format!("{s}\"\"\""));
    out.push(rule.clone());
    out.push(format!("{s}{s}INCLUDE END OF `{path}`"));
    out.push(rule);
    out.push(format!("{s}\"\"\""));
    out
}

fn module_banner(path: &str, name: &str) -> String {
    let rule = "-".repeat(80);
    format!(
        "\n\"\"\"\n{rule}\nPyParams:\n\tauto import of `{path}`\n\tused by: `{name}`\n{rule}\n\"\"\"\n"
    )
}

// Wrapping a unit in a one-off class lets the same unit appear several
// times under different scopes. Public top-level functions are re-exposed
// as instance attributes.
fn encapsulate_unit(name: &str, unit: &str, markers: &MarkerConfig) -> String {
    let module = parse_module(unit);
    let ind = "  ";
    let mut lines = vec![
        format!("class {}:", markers.module_class(name)),
        format!("{ind}def __init__(self):"),
    ];
    for line in unit.split('\n') {
        lines.push(format!("{ind}{ind}{line}"));
    }
    for stmt in &module.body {
        if let Stmt::FunctionDef { name: fn_name, .. } = stmt {
            if !fn_name.starts_with('_') {
                lines.push(format!("{ind}{ind}self.{fn_name} = {fn_name}"));
            }
        }
    }
    lines.join("\n")
}

// `# @import_pyparams_as_source()` turns the next `from X import *` line
// into an explicit directive at the same indent.
fn apply_source_decorators(source: &str, markers: &MarkerConfig) -> Result<String> {
    if !source.contains(&markers.source_decorator) {
        return Ok(source.to_string());
    }
    let import_re = pattern(r"([ ]*)from (.*).*import.*[*].*")?;
    let mut out: Vec<String> = Vec::new();
    let mut pending: Option<String> = None;
    for line in source.split('\n') {
        if pending.take().is_some() {
            let caps = match import_re.captures(line) {
                Some(c) => c,
                None => {
                    return Err(ParamError::MalformedDirective {
                        line: line.to_string(),
                    })
                }
            };
            let col = &caps[1];
            let path = caps[2].trim();
            out.push(format!("{col}{}('{path}')", markers.include_source));
            continue;
        }
        if line.contains(&markers.source_decorator) {
            pending = Some(line.to_string());
            continue;
        }
        out.push(line.to_string());
    }
    if let Some(line) = pending {
        return Err(ParamError::MalformedDirective { line });
    }
    Ok(out.join("\n"))
}

// `# @import_pyparams_as_module(<scope>)` turns the next `import X as Y`
// line into a typed include declaration carrying the decorator's scope
// argument.
fn apply_module_decorators(source: &str, markers: &MarkerConfig) -> Result<String> {
    if !source.contains(&markers.module_decorator) {
        return Ok(source.to_string());
    }
    let import_re = pattern(r"([ ]*)import (.*)[ ]*as[ ]*(.*)[ ]*")?;
    let deco_re = pattern(&format!(
        r".*{}.*\((.*)\).*",
        regex::escape(&markers.module_decorator)
    ))?;
    let mut out: Vec<String> = Vec::new();
    let mut pending: Option<String> = None;
    for line in source.split('\n') {
        if let Some(deco) = pending.take() {
            let (deco_caps, caps) = match (deco_re.captures(&deco), import_re.captures(line))
            {
                (Some(d), Some(c)) => (d, c),
                _ => {
                    return Err(ParamError::MalformedDirective {
                        line: line.to_string(),
                    })
                }
            };
            let mut scope_arg = deco_caps[1].trim().to_string();
            if scope_arg.is_empty() {
                scope_arg = "\"\"".to_string();
            }
            let col = &caps[1];
            let path = caps[2].trim();
            let name = caps[3].trim();
            out.push(format!(
                "{col}{name}: Module = {}('{path}', scope={scope_arg})",
                markers.include
            ));
            continue;
        }
        if line.contains(&markers.module_decorator) {
            pending = Some(line.to_string());
            continue;
        }
        out.push(line.to_string());
    }
    if let Some(line) = pending {
        return Err(ParamError::MalformedDirective { line });
    }
    Ok(out.join("\n"))
}

fn pattern(re: &str) -> Result<Regex> {
    Regex::new(re).map_err(|e| ParamError::UnsupportedSyntax {
        kind: "pattern".to_string(),
        detail: e.to_string(),
    })
}
