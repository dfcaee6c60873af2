use paramcore::scope::{join, prepend, split_head};

#[test]
fn join_determinism() {
    assert_eq!(join("", "x"), "x");
    assert_eq!(join("a/b", "x"), "a/b/x");
    assert_eq!(split_head("a/b/c"), ("a", Some("b/c")));
    assert_eq!(split_head("a"), ("a", None));
}

#[test]
fn prepend_always_inserts_a_separator() {
    assert_eq!(prepend("test", "loop"), "test/loop");
    // the trailing-separator artifact over an empty inner scope is kept
    assert_eq!(prepend("test", ""), "test/");
    assert_eq!(join(&prepend("test", ""), "x"), "test/x");
}
