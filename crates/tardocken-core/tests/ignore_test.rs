use proptest::prelude::*;
use tardocken_core::IgnoreRuleSet;
use tempfile::TempDir;

#[test]
fn parse_skips_empty_lines() {
    let rules = IgnoreRuleSet::parse("\n*.log\n\n\ntarget/\n");
    assert_eq!(rules.len(), 2);
    assert_eq!(rules.patterns().collect::<Vec<_>>(), vec!["*.log", "target"]);
}

#[test]
fn parse_strips_single_trailing_separator() {
    let rules = IgnoreRuleSet::parse("build/\ndist//");
    assert_eq!(rules.patterns().collect::<Vec<_>>(), vec!["build", "dist/"]);
}

#[test]
fn empty_rule_set_matches_nothing() {
    let rules = IgnoreRuleSet::parse("");
    assert!(rules.is_empty());
    assert!(!rules.matches("anything"));
    assert!(!rules.matches(""));
}

#[test]
fn literal_pattern_matches_full_path_only() {
    let rules = IgnoreRuleSet::parse("secrets.txt");
    assert!(rules.matches("secrets.txt"));
    assert!(!rules.matches("config/secrets.txt"));
    assert!(!rules.matches("secrets.txt.bak"));
    assert!(!rules.matches("secrets"));
}

#[test]
fn matching_is_case_sensitive() {
    let rules = IgnoreRuleSet::parse("README.md");
    assert!(rules.matches("README.md"));
    assert!(!rules.matches("readme.md"));
}

#[test]
fn wildcard_matches_extension() {
    let rules = IgnoreRuleSet::parse("*.log");
    assert!(rules.matches("run.log"));
    assert!(!rules.matches("run.txt"));
}

#[test]
fn trailing_separator_pattern_matches_directory() {
    let with_slash = IgnoreRuleSet::parse("build/");
    let without = IgnoreRuleSet::parse("build");
    assert!(with_slash.matches("build"));
    assert!(without.matches("build"));
    assert!(!with_slash.matches("build/out.o"));
}

#[test]
fn dot_files_match_wildcards() {
    let rules = IgnoreRuleSet::parse("*");
    assert!(rules.matches(".git"));
    assert!(rules.matches("."));
}

#[test]
fn carriage_returns_are_part_of_the_pattern() {
    let rules = IgnoreRuleSet::parse("node_modules\r\n");
    assert!(!rules.matches("node_modules"));
}

#[test]
fn from_path_reads_rule_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(".dockerignore");
    std::fs::write(&path, "target/\n.git\n").unwrap();

    let rules = IgnoreRuleSet::from_path(&path).unwrap();
    assert!(rules.matches("target"));
    assert!(rules.matches(".git"));
    assert!(!rules.matches("src"));
}

#[test]
fn from_reader_reads_rule_stream() {
    let rules = IgnoreRuleSet::from_reader("*.log\nbuild/\n".as_bytes()).unwrap();
    assert_eq!(rules.patterns().collect::<Vec<_>>(), vec!["*.log", "build"]);
    assert!(rules.matches("run.log"));
    assert!(rules.matches("build"));
}

#[test]
fn from_reader_fails_for_invalid_utf8() {
    let err = IgnoreRuleSet::from_reader(&b"\xff\xfe"[..]).unwrap_err();
    assert!(err.to_string().contains("failed to read ignore rules"));
}

#[test]
fn from_path_fails_for_missing_file() {
    let tmp = TempDir::new().unwrap();
    let err = IgnoreRuleSet::from_path(&tmp.path().join("missing")).unwrap_err();
    assert!(err.to_string().contains("failed to read ignore rules"));
}

fn path_strategy() -> impl Strategy<Value = String> {
    "[a-z._]{1,8}(/[a-z._]{1,8}){0,3}"
}

proptest! {
    #[test]
    fn matches_is_deterministic(
        patterns in prop::collection::vec("[a-z*?.]{1,8}", 1..5),
        path in path_strategy(),
    ) {
        let rules = IgnoreRuleSet::parse(&patterns.join("\n"));
        let first = rules.matches(&path);
        for _ in 0..3 {
            prop_assert_eq!(rules.matches(&path), first);
        }
    }

    #[test]
    fn trailing_separator_normalization_round_trips(
        pattern in "[a-z*?.]{1,8}(/[a-z*?.]{1,8}){0,2}",
        path in path_strategy(),
    ) {
        let bare = IgnoreRuleSet::parse(&pattern);
        let slashed = IgnoreRuleSet::parse(&format!("{pattern}/"));
        prop_assert_eq!(bare.matches(&path), slashed.matches(&path));
    }

    #[test]
    fn literal_pattern_never_matches_prefix_or_suffix(
        literal in "[a-z]{1,8}(/[a-z]{1,8}){0,2}",
        extra in "[a-z/]{1,4}",
    ) {
        let rules = IgnoreRuleSet::parse(&literal);
        prop_assert!(rules.matches(&literal));
        let longer = format!("{literal}{extra}");
        let prefixed = format!("{extra}{literal}");
        prop_assert!(!rules.matches(&longer));
        prop_assert!(!rules.matches(&prefixed));
    }
}
