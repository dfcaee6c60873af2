// Scope paths are '/'-joined strings; the empty string is the root scope.

pub fn join(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else if scope.ends_with('/') {
        format!("{scope}{name}")
    } else {
        format!("{scope}/{name}")
    }
}

// Always inserts a separator, even over an empty inner scope; `join` over
// the resulting trailing-separator scope still yields a clean full name.
pub fn prepend(prefix: &str, scope: &str) -> String {
    format!("{prefix}/{scope}")
}

pub fn split_head(path: &str) -> (&str, Option<&str>) {
    match path.split_once('/') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}

pub fn segments(scope: &str) -> impl Iterator<Item = &str> {
    scope.split('/').filter(|s| !s.is_empty())
}
