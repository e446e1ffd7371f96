//! Integration tests for the corpus build over a fake extractor tree.

use std::fs;
use std::path::Path;

use wikitext::{build, is_built, BuildOptions, WikitextError};

fn long_text(seed: usize) -> String {
    (0..200)
        .map(|i| format!("t{}x{}", seed, i))
        .collect::<Vec<_>>()
        .join(" ")
}

fn record(title: &str, text: &str) -> String {
    serde_json::json!({ "id": "1", "url": "", "title": title, "text": text }).to_string()
}

/// Ten 200-word articles across two extractor directories, plus a
/// title-only record and a short article that must both be skipped.
fn write_extraction(root: &Path) {
    let mut aa = Vec::new();
    aa.push(record("Empty", "Empty"));
    for i in 0..5 {
        aa.push(record(&format!("Article {}", i), &long_text(i)));
    }
    aa.push(record("Stub", "too short to keep"));

    let mut ab = Vec::new();
    for i in 5..10 {
        ab.push(record(&format!("Article {}", i), &long_text(i)));
    }

    fs::create_dir_all(root.join("AA")).unwrap();
    fs::create_dir_all(root.join("AB")).unwrap();
    fs::write(root.join("AA/wiki_00"), aa.join("\n")).unwrap();
    fs::write(root.join("AB/wiki_00"), ab.join("\n")).unwrap();
}

fn titles(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| l.starts_with("= ") && l.ends_with(" ="))
        .map(|l| l.trim_start_matches("= ").trim_end_matches(" =").to_string())
        .collect()
}

#[test]
fn test_build_with_budget_fills_splits_in_order() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("wiki_extr/xx");
    write_extraction(&input);

    let options = BuildOptions::new(&input, tmp.path().join("wiki"), "xx").with_max_tokens(1000);
    let summary = build(&options).unwrap();

    assert_eq!(summary.total_budget, 1000);
    let train = summary.split("train").unwrap();
    let valid = summary.split("valid").unwrap();
    let test = summary.split("test").unwrap();
    assert_eq!((train.budget, valid.budget, test.budget), (800, 100, 100));

    // each article costs 202 tokens
    assert_eq!(train.stats.documents, 4);
    assert_eq!(valid.stats.documents, 1);
    assert_eq!(test.stats.documents, 1);

    assert_eq!(
        titles(&train.path),
        vec!["Article 0", "Article 1", "Article 2", "Article 3"]
    );
    assert_eq!(titles(&valid.path), vec!["Article 4"]);
    assert_eq!(titles(&test.path), vec!["Article 5"]);

    assert!(train.path.ends_with("wiki/xx/xx.wiki.train.tokens"));
    assert!(is_built(&options));
}

#[test]
fn test_build_without_budget_counts_whole_input() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("extr");
    write_extraction(&input);

    let options = BuildOptions::new(&input, tmp.path().join("out"), "xx");
    let summary = build(&options).unwrap();

    assert_eq!(summary.total_budget, 2020);
    let train = summary.split("train").unwrap();
    assert_eq!(train.budget, 1616);
    assert_eq!(train.stats.documents, 9);
    // "=", title words and 200 distinct tokens per article
    assert!(train.unique_tokens > 9 * 200);

    let body = fs::read_to_string(&train.path).unwrap();
    assert!(!body.contains("Stub"));
    assert!(!body.contains("= Empty ="));
}

#[test]
fn test_missing_input_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let options = BuildOptions::new(tmp.path().join("missing"), tmp.path().join("out"), "xx");

    let err = build(&options).unwrap_err();
    assert!(matches!(err, WikitextError::MissingInput(_)));
    assert!(!is_built(&options));
}
