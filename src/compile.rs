//! Compilation of one template source against a parameter document.

use std::collections::{BTreeMap, HashMap};

use paramcore::doc::{self, DocTree};
use paramcore::{EventLog, NamedParam, ParamError, Result, Stage};
use pylang::{parse_module, render_module, Expr};

use crate::codec;
use crate::markers::MarkerConfig;
use crate::rewrite;
use crate::scan;

/// Every parameter declared in the source, in declaration order.
pub fn extract_params(source: &str, markers: &MarkerConfig) -> Result<Vec<NamedParam>> {
    let module = parse_module(source);
    let sites = scan::scan_params(&module, &markers.param)?;
    let mut params = Vec::with_capacity(sites.len());
    for site in &sites {
        params.push(codec::param_from_call(&site.name, &site.call)?);
    }
    Ok(params)
}

/// Extraction straight to the nested document form.
pub fn source_to_document(source: &str, markers: &MarkerConfig) -> Result<DocTree> {
    let params = extract_params(source, markers)?;
    Ok(doc::flatten_to_document(&params))
}

/// Rewrites every declaration the document names to its literal value.
///
/// A document entry with no declaration site in the source is an error; a
/// source declaration the document does not mention stays live. When two
/// sites share a full name the later one receives the value.
pub fn compile_source(
    source: &str,
    document: &DocTree,
    markers: &MarkerConfig,
    validate_version: bool,
    events: &mut EventLog,
) -> Result<String> {
    let mut module = parse_module(source);
    let sites = scan::scan_params(&module, &markers.param)?;
    let mut source_params = Vec::with_capacity(sites.len());
    for site in &sites {
        source_params.push(codec::param_from_call(&site.name, &site.call)?);
    }
    let config = doc::unflatten_from_document(document);
    if validate_version {
        validate_version_keys(&source_params, &config, &markers.version_key)?;
    }

    let mut site_by_name: HashMap<String, usize> = HashMap::new();
    for (i, p) in source_params.iter().enumerate() {
        site_by_name.insert(p.full_name(), i);
    }

    let mut subs: BTreeMap<usize, Expr> = BTreeMap::new();
    for cfg in &config {
        let key = cfg.full_name();
        match site_by_name.get(&key) {
            Some(&i) => {
                subs.insert(i, codec::encode(&cfg.record.value, cfg.record.dtype)?);
            }
            None => {
                return Err(ParamError::KeyNotFound {
                    key,
                    known: source_params.iter().map(|p| p.full_name()).collect(),
                });
            }
        }
    }
    events.push(
        Stage::Compile,
        "source",
        format!(
            "substituted {} of {} declarations",
            subs.len(),
            sites.len()
        ),
    );
    rewrite::apply(&mut module, &sites, &subs)?;
    Ok(render_module(&module))
}

/// Rewrites each declaration site to a full record call carrying the paired
/// parameter's fields. Pairs up in scan order; surplus on either side is
/// left alone.
pub fn update_source_params(
    source: &str,
    new_params: &[NamedParam],
    markers: &MarkerConfig,
) -> Result<String> {
    let mut module = parse_module(source);
    let sites = scan::scan_params(&module, &markers.param)?;
    let mut subs: BTreeMap<usize, Expr> = BTreeMap::new();
    for (site, np) in sites.iter().zip(new_params) {
        subs.insert(site.index, codec::encode_full_record(&np.record, markers)?);
    }
    rewrite::apply(&mut module, &sites, &subs)?;
    Ok(render_module(&module))
}

// The source declares its version unscoped; the document carries it under
// whatever nesting the extraction produced, so only the bare name is matched
// there.
fn validate_version_keys(
    source_params: &[NamedParam],
    config: &[NamedParam],
    version_key: &str,
) -> Result<()> {
    let from_source = source_params
        .iter()
        .find(|p| p.full_name() == version_key)
        .map(|p| p.record.value.clone());
    let from_doc = config
        .iter()
        .find(|p| p.name == version_key)
        .map(|p| p.record.value.clone());
    match (&from_source, &from_doc) {
        (Some(a), Some(b)) if a == b => Ok(()),
        _ => Err(ParamError::VersionMismatch {
            source_version: from_source
                .map(|v| v.to_string())
                .unwrap_or_else(|| "absent".to_string()),
            document: from_doc
                .map(|v| v.to_string())
                .unwrap_or_else(|| "absent".to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramcore::yamlfmt;
    use pretty_assertions::assert_eq;

    const TEMPLATE: &str = "\
version = PyParam('0.5')
start_index: int = PyParam(1, scope=\"main\", desc=\"where the loop starts\")
max_iters: int = PyParam(value=6, dtype='int', scope='main')
";

    #[test]
    fn extraction_keeps_declaration_order() {
        let markers = MarkerConfig::default();
        let params = extract_params(TEMPLATE, &markers).unwrap();
        let names: Vec<String> = params.iter().map(|p| p.full_name()).collect();
        assert_eq!(names, ["version", "main/start_index", "main/max_iters"]);
    }

    #[test]
    fn compile_substitutes_literals_at_original_indent() {
        let markers = MarkerConfig::default();
        let document = source_to_document(TEMPLATE, &markers).unwrap();
        let mut events = EventLog::new();
        let compiled =
            compile_source(TEMPLATE, &document, &markers, true, &mut events).unwrap();
        assert!(compiled.contains("start_index: int = 1"));
        assert!(compiled.contains("max_iters: int = 6"));
        assert!(compiled.contains("version = '0.5'"));
        assert!(!compiled.contains(&markers.param));
    }

    #[test]
    fn unknown_document_key_names_the_known_ones() {
        let markers = MarkerConfig::default();
        let yaml = "\
main:
  missing:
    dtype: int
    value: 9
";
        let document = yamlfmt::read_document(yaml).unwrap();
        let mut events = EventLog::new();
        let err = compile_source(TEMPLATE, &document, &markers, false, &mut events)
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("main/missing"));
        assert!(text.contains("main/start_index"));
    }

    #[test]
    fn undocumented_declarations_stay_live() {
        let markers = MarkerConfig::default();
        let yaml = "\
main:
  start_index:
    dtype: int
    value: 4
";
        let document = yamlfmt::read_document(yaml).unwrap();
        let mut events = EventLog::new();
        let compiled =
            compile_source(TEMPLATE, &document, &markers, false, &mut events).unwrap();
        assert!(compiled.contains("start_index: int = 4"));
        assert!(compiled.contains("max_iters: int = PyParam(value=6"));
    }

    #[test]
    fn version_disagreement_is_fatal() {
        let markers = MarkerConfig::default();
        let yaml = "\
version:
  dtype: str
  value: '0.6'
main:
  start_index:
    dtype: int
    value: 4
";
        let document = yamlfmt::read_document(yaml).unwrap();
        let mut events = EventLog::new();
        let err = compile_source(TEMPLATE, &document, &markers, true, &mut events)
            .unwrap_err();
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn missing_version_reads_as_absent() {
        let markers = MarkerConfig::default();
        let yaml = "\
main:
  start_index:
    dtype: int
    value: 4
";
        let document = yamlfmt::read_document(yaml).unwrap();
        let mut events = EventLog::new();
        let err = compile_source(TEMPLATE, &document, &markers, true, &mut events)
            .unwrap_err();
        assert!(err.to_string().contains("absent"));
    }

    #[test]
    fn update_rewrites_full_records() {
        let markers = MarkerConfig::default();
        let params = extract_params(TEMPLATE, &markers).unwrap();
        let rescoped = paramcore::reconcile::add_scope("test", &params);
        let updated = update_source_params(TEMPLATE, &rescoped, &markers).unwrap();
        assert!(updated.contains(
            "start_index: int = PyParam(value=1, dtype='int', scope='test/main', \
             desc='where the loop starts')"
        ));
        let reread = extract_params(&updated, &markers).unwrap();
        assert_eq!(reread, rescoped);
    }
}
