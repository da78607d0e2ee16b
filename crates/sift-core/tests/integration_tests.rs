//! Integration tests for sift-core
//!
//! These tests exercise the full settings → engine → batch workflow with the
//! deterministic mock embedder.

use std::collections::HashSet;
use std::fs;

use sift_core::{
    categorize_table, clean_table, cosine_similarity, normalize, summarize, Categorizer,
    EmbeddingClient, Error, MatchTier, Method, MockEmbedder, NameDetector, RuleTable, Settings,
    Table,
};

/// A statement in the shape most Indian bank exports use
fn statement_csv() -> &'static str {
    r#"Date,Narration,Ref/Cheque No.,Debit,Credit,Balance
01/04/24,UPI-SWIGGY-ORDER 45821@okaxis,4101,450.00,,"10,550.00"
02/04/24,NETFLIX.COM SUBSCRIPTION,4102,649.00,,"9,901.00"
03/04/24,TO RAHUL VERMA,4103,"2,000.00",,"7,901.00"
04/04/24,UPI/PRIYA/okicici,4104,300.00,,"7,601.00"
05/04/24,entertainment weekend,4105,"1,200.00",,"6,401.00"
06/04/24,,4106,-,,"6,401.00"
07/04/24,SALARY CREDIT APRIL,4107,-,"50,000.00","56,401.00"
"#
}

fn mock() -> MockEmbedder {
    MockEmbedder::new().with_alias("cinema", "entertainment")
}

fn engine_with(mock: MockEmbedder) -> Categorizer {
    let settings = Settings::default();
    Categorizer::new(
        &settings,
        RuleTable::embedded().expect("embedded rules"),
        NameDetector::new(&settings.names.friend_patterns, ["priya", "rahul verma"]),
        EmbeddingClient::Mock(mock),
    )
    .expect("engine")
}

fn engine() -> Categorizer {
    engine_with(mock())
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_swiggy_order_is_rule_engine() {
    let r = engine().categorize(Some("SWIGGY ORDER 45821")).unwrap();
    assert_eq!(r.category, "Food & Beverage");
    assert_eq!(r.tag_list(), vec!["Online Order", "Restaurant", "Delivery"]);
    assert_eq!(r.method.to_string(), "Rule Engine");
    assert_eq!(r.tier, Some(MatchTier::FullPhrase));
}

#[test]
fn test_exact_phrase_always_full_phrase_tier() {
    let engine = engine();
    for rule in engine.rules().table().rules() {
        let description = format!("POS {} #123", rule.phrase.to_uppercase());
        let r = engine.categorize(Some(description.as_str())).unwrap();
        assert_eq!(r.method, Method::RuleEngine, "{}", description);
        assert_eq!(r.tier, Some(MatchTier::FullPhrase), "{}", description);

        // First full-phrase rule in table order may be an earlier, shorter phrase
        let expected = engine
            .rules()
            .table()
            .rules()
            .iter()
            .find(|other| normalize(Some(description.as_str())).contains(other.phrase.as_str()))
            .unwrap();
        assert_eq!(r.category, expected.category, "{}", description);
    }
}

#[test]
fn test_friend_pattern_resolves_to_default_label() {
    // "rahul verma" is also a known name: the transfer marker still wins
    let r = engine().categorize(Some("TO RAHUL VERMA")).unwrap();
    assert_eq!(r.category, "Uncategorized");
    assert_eq!(r.method, Method::FriendFilter);
    assert_eq!(r.tags, [None, None, None]);
}

#[test]
fn test_rule_beats_friend_pattern() {
    let r = engine().categorize(Some("IMPS TO SWIGGY BANGALORE")).unwrap();
    assert_eq!(r.method, Method::RuleEngine);
    assert_eq!(r.category, "Food & Beverage");
}

#[test]
fn test_empty_description() {
    let r = engine().categorize(Some("")).unwrap();
    assert_eq!(r.category, "Uncategorized");
    assert_eq!(r.method, Method::Default);
    assert!(r.tag_list().is_empty());
}

#[test]
fn test_semantic_entertainment() {
    let r = engine().categorize(Some("CINEMA WEEKEND")).unwrap();
    assert_eq!(r.category, "Entertainment");
    assert_eq!(r.method, Method::SemanticFallback);
    assert_eq!(r.method.to_string(), "Semantic Fallback");
}

// =============================================================================
// Properties
// =============================================================================

const VARIED: &[&str] = &[
    "",
    "   ",
    "#*@",
    "ZOMATO",
    "amazon prime video",
    "reliance gas cylinder",
    "IMPS FROM 9932",
    "upi priya",
    "coffee cafe streaming music",
    "movie night coffee",
    "quarterly membership",
    "electricity water rent",
    "NEFT/SALARY/ACME CORP",
];

#[test]
fn test_category_never_empty() {
    let engine = engine();
    for &description in VARIED {
        let r = engine.categorize(Some(description)).unwrap();
        assert!(!r.category.trim().is_empty(), "{:?}", description);
    }
    assert!(!engine.categorize(None).unwrap().category.is_empty());
}

#[test]
fn test_semantic_tags_unique_and_above_threshold() {
    let embedder = mock();
    let engine = engine_with(embedder.clone());
    let threshold = engine.settings().tag_threshold;

    for &description in VARIED {
        let r = engine.categorize(Some(description)).unwrap();
        let tags = r.tag_list();
        let unique: HashSet<&str> = tags.iter().copied().collect();
        assert_eq!(unique.len(), tags.len(), "{:?}", description);

        if r.method == Method::SemanticFallback {
            let desc = embedder.vector(&normalize(Some(description)));
            for tag in tags {
                let sim = cosine_similarity(&desc, &embedder.vector(tag));
                assert!(sim >= threshold, "{} -> {} ({})", description, tag, sim);
            }
        }
    }
}

#[test]
fn test_normalize_idempotent_on_varied_input() {
    for &description in VARIED {
        let once = normalize(Some(description));
        assert_eq!(normalize(Some(once.as_str())), once);
    }
}

#[test]
fn test_batch_twice_is_byte_identical() {
    let engine = engine();
    let input = Table::from_reader(statement_csv().as_bytes()).unwrap();

    let mut first = Vec::new();
    let mut second = Vec::new();
    categorize_table(&engine, &input, None, true)
        .unwrap()
        .table
        .write_to(&mut first)
        .unwrap();
    categorize_table(&engine, &input, None, true)
        .unwrap()
        .table
        .write_to(&mut second)
        .unwrap();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

// =============================================================================
// End-to-end workflow
// =============================================================================

#[test]
fn test_statement_workflow() {
    let engine = engine();
    let raw = Table::from_reader(statement_csv().as_bytes()).unwrap();
    let cleaned = clean_table(&raw, None).unwrap();
    assert_eq!(cleaned.duplicates_removed, 0);

    let out = categorize_table(&engine, &cleaned.table, None, false).unwrap();
    assert_eq!(out.description_column, "Narration");

    let methods: Vec<&str> = out
        .table
        .column(out.table.column_index("Method").unwrap())
        .collect();
    assert_eq!(
        methods,
        vec![
            "Rule Engine",
            "Rule Engine",
            "Friend Filter",
            "Friend Family",
            "Semantic Fallback",
            "Default",
            "Rule Engine",
        ]
    );

    let summary = summarize(&out);
    let spend = summary.spend.expect("debit column present");
    assert_eq!(spend.debit_rows, 5);
    assert_eq!(spend.total, 4599.0);
    assert_eq!(spend.highest().unwrap().category, "Uncategorized");
    assert_eq!(summary.low_confidence, 0);
}

#[test]
fn test_backend_failure_leaves_no_output() {
    let embedder = mock();
    let engine = engine_with(embedder.clone());
    embedder.set_failing(true);

    let input = Table::from_reader(statement_csv().as_bytes()).unwrap();
    let err = categorize_table(&engine, &input, None, false).unwrap_err();
    assert!(matches!(err, Error::Embedding(_)));
}

#[test]
fn test_existing_output_column_names_are_preserved() {
    let engine = engine();
    let input = Table::from_reader(
        "Date,Narration,Category,Method,Debit
         01/04,NETFLIX.COM SUBSCRIPTION,Bills,card,649
         02/04,TO RAHUL VERMA,Transfers,imps,2000
"
            .as_bytes(),
    )
    .unwrap();

    let out = categorize_table(&engine, &input, None, false).unwrap();
    assert_eq!(out.table.headers().len(), input.headers().len() + 5);
    assert_eq!(
        out.output_columns,
        vec!["Category_1", "Tag_1", "Tag_2", "Tag_3", "Method_1"]
    );

    for (before, after) in input.rows().iter().zip(out.table.rows()) {
        assert_eq!(before[..], after[..5]);
    }
    let categories: Vec<&str> = out.table.column(5).collect();
    assert_eq!(categories, vec!["Entertainment", "Uncategorized"]);
    let methods: Vec<&str> = out.table.column(9).collect();
    assert_eq!(methods, vec!["Rule Engine", "Friend Filter"]);
}

#[test]
fn test_missing_description_column() {
    let input = Table::from_reader("Date,Debit\n01/04,10\n".as_bytes()).unwrap();
    let err = categorize_table(&engine(), &input, None, false).unwrap_err();
    assert!(matches!(err, Error::MissingDescriptionColumn { .. }));
}

// =============================================================================
// Configuration files
// =============================================================================

#[test]
fn test_engine_from_files() {
    let dir = tempfile::tempdir().unwrap();

    let rules = dir.path().join("merchants.toml");
    fs::write(
        &rules,
        r#"
[[rule]]
phrase = "Corner-Bakery"
category = "Food"
tags = ["Bakery"]

[[rule]]
phrase = "metro card"
category = "Transport"
tags = []
"#,
    )
    .unwrap();

    let names = dir.path().join("names.txt");
    fs::write(&names, "Anita\n").unwrap();

    let config = dir.path().join("sift.toml");
    fs::write(
        &config,
        format!(
            r#"
[engine]
default_label = "Others"

[names]
friend_patterns = ["NEFT TO"]
file = "{}"

[embedding]
backend = "mock"
"#,
            names.display()
        ),
    )
    .unwrap();

    let settings = Settings::load(Some(config.as_path())).unwrap();
    let engine = Categorizer::from_settings(&settings, Some(rules.as_path())).unwrap();

    let bakery = engine.categorize(Some("CORNER BAKERY 12")).unwrap();
    assert_eq!(bakery.category, "Food");
    assert_eq!(bakery.tag_list(), vec!["Bakery"]);

    let transfer = engine.categorize(Some("NEFT TO ANITA")).unwrap();
    assert_eq!(transfer.category, "Others");
    assert_eq!(transfer.method, Method::FriendFilter);

    let friend = engine.categorize(Some("UPI ANITA")).unwrap();
    assert_eq!(friend.category, "Friends and Family");

    let categories: Vec<&str> = engine.semantic().category_names().collect();
    assert_eq!(categories, vec!["Food", "Transport", "Friends and Family"]);
}

#[test]
fn test_duplicate_rule_phrase_rejected() {
    let err = RuleTable::from_toml(
        r#"
[[rule]]
phrase = "uber"
category = "Travel"

[[rule]]
phrase = "UBER"
category = "Shopping"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
