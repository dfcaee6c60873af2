use crate::doc::{self, DocTree};
use crate::error::{ParamError, Result};
use crate::event::{EventLog, Stage};
use crate::record::NamedParam;
use crate::scope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Strict,
    Permissive,
}

// Per-key wholesale record replacement. The merged list keeps the old
// list's ordering; a replaced key stays where it was. The designated
// version entry is reported but never replaced.
pub fn replace_params(
    new: &[NamedParam],
    old: &[NamedParam],
    mode: MatchMode,
    version_key: &str,
    events: &mut EventLog,
) -> Result<Vec<NamedParam>> {
    let mut merged: Vec<NamedParam> = old.to_vec();
    for np in new {
        let key = np.full_name();
        if key == version_key {
            events.push(Stage::Reconcile, &key, "not changed");
            continue;
        }
        match merged.iter().position(|op| op.full_name() == key) {
            Some(idx) => {
                if merged[idx].record.value == np.record.value {
                    events.push(Stage::Reconcile, &key, "not changed");
                } else {
                    events.push(Stage::Reconcile, &key, "replacing");
                }
                merged[idx].record = np.record.clone();
            }
            None => match mode {
                MatchMode::Strict => {
                    return Err(ParamError::KeyNotFound {
                        key,
                        known: merged.iter().map(|p| p.full_name()).collect(),
                    })
                }
                MatchMode::Permissive => {
                    events.push(Stage::Reconcile, &key, "ignoring missing");
                }
            },
        }
    }
    Ok(merged)
}

pub fn get_param<'a>(key: &str, params: &'a [NamedParam]) -> Result<&'a NamedParam> {
    params
        .iter()
        .find(|p| p.full_name() == key)
        .ok_or_else(|| ParamError::KeyNotFound {
            key: key.to_string(),
            known: params.iter().map(|p| p.full_name()).collect(),
        })
}

pub fn add_scope(prefix: &str, params: &[NamedParam]) -> Vec<NamedParam> {
    params
        .iter()
        .map(|p| {
            let mut p = p.clone();
            p.record.scope = scope::prepend(prefix, &p.record.scope);
            p
        })
        .collect()
}

// Document-to-document substitution: every update param whose full name
// contains one of the selected key substrings (all of them when no filter
// is given) replaces its counterpart in the base document.
pub fn substitute(
    base: &DocTree,
    updates: &DocTree,
    mode: MatchMode,
    selected_keys: &[String],
    version_key: &str,
    events: &mut EventLog,
) -> Result<DocTree> {
    let old = doc::unflatten_from_document(base);
    let mut new = doc::unflatten_from_document(updates);
    if !selected_keys.is_empty() {
        new.retain(|p| {
            let full = p.full_name();
            selected_keys.iter().any(|k| full.contains(k.as_str()))
        });
    }
    events.push(
        Stage::Substitute,
        "document",
        format!("{} candidate keys", new.len()),
    );
    let merged = replace_params(&new, &old, mode, version_key, events)?;
    Ok(doc::flatten_to_document(&merged))
}
