// Names the engine recognizes in template sources. Matching is exact and
// unqualified: an aliased or attribute-qualified marker is invisible.
#[derive(Debug, Clone)]
pub struct MarkerConfig {
    /// Parameter declaration call, `name: ann = PyParam(...)`.
    pub param: String,
    /// Module include declaration, `name: Module = IncludeModule(path, scope)`.
    pub include: String,
    /// Derive directive, a bare `DeriveModule(path)` statement.
    pub derive: String,
    /// Include override used together with the derive directive.
    pub replace: String,
    /// Textual source inclusion, a bare `IncludeSource(path)` statement.
    pub include_source: String,
    /// Comment decorator rewritten to an include declaration.
    pub module_decorator: String,
    /// Comment decorator rewritten to a source inclusion.
    pub source_decorator: String,
    /// Import line prepended to composed output.
    pub runtime_import: String,
    /// Prefix of generated encapsulation class names.
    pub class_prefix: String,
    /// Parameter name compared by version validation.
    pub version_key: String,
}

impl Default for MarkerConfig {
    fn default() -> MarkerConfig {
        MarkerConfig {
            param: "PyParam".to_string(),
            include: "IncludeModule".to_string(),
            derive: "DeriveModule".to_string(),
            replace: "ReplaceModule".to_string(),
            include_source: "IncludeSource".to_string(),
            module_decorator: "@import_pyparams_as_module".to_string(),
            source_decorator: "@import_pyparams_as_source".to_string(),
            runtime_import: "from pyparams import Module".to_string(),
            class_prefix: "_pyparam_module__".to_string(),
            version_key: "version".to_string(),
        }
    }
}

impl MarkerConfig {
    pub fn module_class(&self, name: &str) -> String {
        format!("{}{}()", self.class_prefix, name)
    }
}
