//! Unit tests for cluster candidate selection.

use proptest::prelude::*;
use rstest::{fixture, rstest};

use crate::{
    ClusterFlags, ClusterSizeBounds, ClusteringError, ConfigError, NGramModel, SelectionStrategy,
    SignificanceWeights, SubsumedCounts, SuffixClustering, SuffixClusteringBuilder, SuffixTrie,
    test_utils::trie_from_names,
};

fn unbounded(proportion: f64) -> SuffixClustering {
    SuffixClusteringBuilder::new()
        .with_proportion(proportion)
        .with_min_percent(0.0)
        .with_max_percent(0.0)
        .build()
        .expect("configuration must be valid")
}

fn with_alpha(alpha: f64) -> SuffixClustering {
    SuffixClusteringBuilder::new()
        .with_min_percent(0.0)
        .with_max_percent(0.0)
        .with_alpha(alpha)
        .with_strategy(SelectionStrategy::Significance)
        .build()
        .expect("configuration must be valid")
}

/// One root `a` with 40 records: `ga` and `ka` each hold half, and below
/// `ga` the single chain `iga -> riga` keeps nine records.
#[fixture]
fn nested_corpus() -> SuffixTrie {
    let mut names: Vec<String> = Vec::new();
    for prefix in 'b'..='j' {
        names.push(format!("{prefix}riga"));
        names.push(format!("{prefix}oga"));
    }
    names.extend(["buga".to_owned(), "cuga".to_owned()]);
    for prefix in 'b'..='u' {
        names.push(format!("{prefix}ka"));
    }
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    trie_from_names(&refs)
}

/// Root `a` splits into `xa` (7 records) and `ya` (5 records); the extra
/// `yyyyo` makes `y` more frequent than `x` in the letter table.
#[fixture]
fn split_corpus() -> SuffixTrie {
    trie_from_names(&[
        "bxa", "cxa", "dxa", "exa", "fxa", "gxa", "hxa", "bya", "cya", "dya", "eya", "fya",
        "yyyyo",
    ])
}

#[rstest]
#[case::defaults(200, 0.05, 0.05, 10, 190)]
#[case::floor(40, 0.05, 0.05, 5, 38)]
#[case::tiny(2, 0.05, 0.05, 5, 0)]
#[case::single(1, 0.0, 0.0, 5, -1)]
#[case::rounds_half_away_from_zero(30, 0.25, 0.25, 8, 23)]
fn size_bounds_follow_tree_size(
    #[case] records: u64,
    #[case] min_percent: f64,
    #[case] max_percent: f64,
    #[case] min: i64,
    #[case] max: i64,
) {
    let bounds = ClusterSizeBounds::for_root(records, min_percent, max_percent);
    assert_eq!((bounds.min(), bounds.max()), (min, max));
}

#[rstest]
fn tiny_trees_yield_no_candidates() {
    let trie = trie_from_names(&["leipzig", "pelzig"]);
    let counts = SubsumedCounts::compute(&trie);
    let clustering = SuffixClusteringBuilder::new()
        .with_proportion(0.8)
        .build()
        .expect("configuration must be valid");

    let set = clustering
        .by_proportion(&trie, &counts)
        .expect("selection must succeed");
    assert!(set.is_empty());
}

#[rstest]
fn proportion_keeps_the_longest_dominant_tail() {
    let trie = trie_from_names(&[
        "altdorf",
        "bischofsdorf",
        "eckdorf",
        "kirchdorf",
        "langendorf",
        "neudorf",
        "oberdorf",
        "waldorf",
        "elf",
        "golf",
    ]);
    let counts = SubsumedCounts::compute(&trie);

    let set = unbounded(0.5)
        .by_proportion(&trie, &counts)
        .expect("selection must succeed");
    assert_eq!(set.suffixes(&trie), ["dorf"]);
}

#[rstest]
fn proportion_removes_every_marked_ancestor(nested_corpus: SuffixTrie) {
    let trie = nested_corpus;
    let counts = SubsumedCounts::compute(&trie);
    assert_eq!(trie.find("a").and_then(|a| counts.get(a)), Some(40));

    let set = unbounded(0.5)
        .by_proportion(&trie, &counts)
        .expect("selection must succeed");
    assert_eq!(set.suffixes(&trie), ["ka", "riga"]);
    assert!(set.nested_pairs(&trie).is_empty());
}

#[rstest]
fn proportion_requires_counts() {
    let trie = trie_from_names(&["leipzig", "pelzig"]);
    let counts = SubsumedCounts::new(&trie);

    let err = unbounded(0.5)
        .by_proportion(&trie, &counts)
        .expect_err("counts were never aggregated");
    assert_eq!(
        err,
        ClusteringError::PreconditionNotMet {
            suffix: "g".into(),
            phase: "proportion selection",
        }
    );
}

#[rstest]
fn significance_ranks_the_rarer_letter_higher(split_corpus: SuffixTrie) {
    let trie = split_corpus;
    let counts = SubsumedCounts::compute(&trie);
    let model = NGramModel::from_trie(&trie);
    let clustering = with_alpha(1.5);
    let a = trie.find("a").expect("a exists");
    let xa = trie.find("xa").expect("xa exists");
    let ya = trie.find("ya").expect("ya exists");

    let x = clustering
        .significance(&trie, &counts, &model, a, xa)
        .expect("xa is testable");
    let y = clustering
        .significance(&trie, &counts, &model, a, ya)
        .expect("ya is testable");

    assert!((x.actual() - 7.0 / 12.0).abs() < 1e-12);
    assert!((y.actual() - 5.0 / 12.0).abs() < 1e-12);
    // P(x) = 7/41, P(xa)/P(a) = (7/54)/(12/41), P(xa#)/P(a#) = (7/67)/(12/54).
    let expected_x = 0.2 * 7.0 / 41.0 + 0.3 * (7.0 / 54.0) / (12.0 / 41.0)
        + 0.5 * (7.0 / 67.0) / (12.0 / 54.0);
    assert!((x.expected() - expected_x).abs() < 1e-12);
    assert!(x.ratio() > y.ratio());
}

#[rstest]
fn significance_flags_only_the_significant_sibling(split_corpus: SuffixTrie) {
    let trie = split_corpus;
    let counts = SubsumedCounts::compute(&trie);
    let model = NGramModel::from_trie(&trie);
    let a = trie.find("a").expect("a exists");
    let xa = trie.find("xa").expect("xa exists");
    let ya = trie.find("ya").expect("ya exists");
    let probe = with_alpha(1.5);
    let x_ratio = probe
        .significance(&trie, &counts, &model, a, xa)
        .expect("xa is testable")
        .ratio();
    let y_ratio = probe
        .significance(&trie, &counts, &model, a, ya)
        .expect("ya is testable")
        .ratio();

    let clustering = with_alpha((x_ratio + y_ratio) / 2.0);
    let mut flags = ClusterFlags::new(&trie);
    clustering
        .by_significance(&trie, &counts, &model, &mut flags)
        .expect("selection must succeed");

    assert!(flags.is_flagged(xa));
    assert!(!flags.is_flagged(ya));
    assert_eq!(flags.candidates().suffixes(&trie), ["xa"]);
}

#[rstest]
#[case::all_significant(1e-3)]
#[case::none_significant(100.0)]
fn significance_flags_nothing_when_siblings_agree(split_corpus: SuffixTrie, #[case] alpha: f64) {
    let trie = split_corpus;
    let counts = SubsumedCounts::compute(&trie);
    let model = NGramModel::from_trie(&trie);

    let set = with_alpha(alpha)
        .select(&trie, &counts, &model)
        .expect("selection must succeed");
    assert!(set.is_empty());
}

#[rstest]
fn significance_reports_unknown_ngrams(split_corpus: SuffixTrie) {
    let trie = split_corpus;
    let counts = SubsumedCounts::compute(&trie);
    let model = NGramModel::from_names(["hof"]);
    let mut flags = ClusterFlags::new(&trie);

    let err = with_alpha(1.5)
        .by_significance(&trie, &counts, &model, &mut flags)
        .expect_err("the model never saw `x`");
    assert!(matches!(&err, ClusteringError::NGram { suffix, .. } if &**suffix == "xa"));
    assert_eq!(err.code().as_str(), "CLUSTERING_UNKNOWN_NGRAM");
    assert_eq!(
        err.ngram_code().map(|code| code.as_str()),
        Some("NGRAM_UNKNOWN")
    );
}

#[rstest]
fn select_dispatches_on_strategy(nested_corpus: SuffixTrie) {
    let trie = nested_corpus;
    let counts = SubsumedCounts::compute(&trie);
    let model = NGramModel::from_trie(&trie);
    let clustering = unbounded(0.5);
    assert_eq!(clustering.strategy(), SelectionStrategy::Proportion);

    let selected = clustering
        .select(&trie, &counts, &model)
        .expect("selection must succeed");
    let direct = clustering
        .by_proportion(&trie, &counts)
        .expect("selection must succeed");
    assert_eq!(selected, direct);
}

#[rstest]
#[case::proportion_high(
    SuffixClusteringBuilder::new().with_proportion(1.2),
    ConfigError::OutOfRange { parameter: "proportion", value: 1.2 }
)]
#[case::min_negative(
    SuffixClusteringBuilder::new().with_min_percent(-0.1),
    ConfigError::OutOfRange { parameter: "min_percent", value: -0.1 }
)]
#[case::max_high(
    SuffixClusteringBuilder::new().with_max_percent(2.0),
    ConfigError::OutOfRange { parameter: "max_percent", value: 2.0 }
)]
#[case::negative_weight(
    SuffixClusteringBuilder::new().with_weights(SignificanceWeights::new(-0.5, 0.5, 1.0)),
    ConfigError::InvalidWeight { parameter: "letter_weight", value: -0.5 }
)]
#[case::weight_sum(
    SuffixClusteringBuilder::new().with_weights(SignificanceWeights::new(0.5, 0.5, 0.5)),
    ConfigError::WeightSum { sum: 1.5 }
)]
#[case::zero_alpha(
    SuffixClusteringBuilder::new().with_alpha(0.0),
    ConfigError::InvalidAlpha { alpha: 0.0 }
)]
fn builder_rejects_invalid_configuration(
    #[case] builder: SuffixClusteringBuilder,
    #[case] expected: ConfigError,
) {
    let err = builder.build().expect_err("configuration must be rejected");
    assert_eq!(err, expected);
}

#[rstest]
fn builder_rejects_nan_proportion() {
    let err = SuffixClusteringBuilder::new()
        .with_proportion(f64::NAN)
        .build()
        .expect_err("NaN is not a fraction");
    assert_eq!(err.code().as_str(), "CONFIG_OUT_OF_RANGE");
}

#[rstest]
fn builder_defaults() {
    let clustering = SuffixClusteringBuilder::new()
        .build()
        .expect("defaults are valid");
    assert_eq!(clustering.proportion(), 0.8);
    assert_eq!(clustering.min_percent(), 0.05);
    assert_eq!(clustering.max_percent(), 0.05);
    assert_eq!(clustering.alpha(), 1.5);
    assert_eq!(clustering.weights(), SignificanceWeights::new(0.2, 0.3, 0.5));
    assert_eq!(clustering.strategy(), SelectionStrategy::Proportion);
}

proptest! {
    #[test]
    fn proportion_candidates_never_nest(
        names in prop::collection::vec("[a-c]{1,5}", 10..80),
        proportion in 0.0_f64..=1.0,
    ) {
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let trie = trie_from_names(&refs);
        let counts = SubsumedCounts::compute(&trie);
        let set = unbounded(proportion)
            .by_proportion(&trie, &counts)
            .expect("selection must succeed");
        prop_assert!(set.nested_pairs(&trie).is_empty());
        for id in set.iter() {
            let count = counts.get(id).unwrap_or_default();
            prop_assert!(count >= 5);
        }
    }
}
