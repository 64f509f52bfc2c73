use engine::tokenizer::{parse_stopwords, Tokenizer};

#[test]
fn it_normalizes_and_lowercases() {
    let t = Tokenizer::new(Default::default(), 3);
    let words = t.tokenize("Running RUNNERS run! The ﬁne café's menu.");
    // no stemming: inflected forms stay distinct
    assert!(words.contains(&"running".to_string()));
    assert!(words.contains(&"runners".to_string()));
    // NFKC folds the ligature
    assert!(words.contains(&"fine".to_string()));
    assert!(words.contains(&"café".to_string()));
}

#[test]
fn it_filters_stopwords() {
    let t = Tokenizer::new(parse_stopwords("the\nand\nquick"), 3);
    let words = t.tokenize("The quick brown fox and the lazy dog");
    assert_eq!(words, vec!["brown", "fox", "lazy", "dog"]);
}
