use labelaudit::label::{classify, parse_record, LabelRecord, LineOutcome, SizeClass};
use labelaudit::layout::{DatasetLayout, Split};
use labelaudit::metrics::{MetricsAccumulator, MetricsAggregator, MetricsTable};
use labelaudit::sink::NullSink;
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

fn arb_record() -> impl Strategy<Value = (String, LabelRecord)> {
    ("[a-e]", 0u8..5, 0.0f64..=1.0, 0.0f64..=1.0).prop_map(|(stem, class_id, width, height)| {
        (
            stem,
            LabelRecord {
                class_id: class_id as f64,
                width,
                height,
            },
        )
    })
}

const SPLIT_NAMES: [&str; 3] = ["train", "valid", "test"];

/// Label file bodies, one per stem `f0`, `f1`, ..., each with the split it
/// is placed in.
fn arb_label_files() -> impl Strategy<Value = Vec<(usize, String)>> {
    let line = (0u8..5, 0.0f64..=1.0, 0.0f64..=1.0)
        .prop_map(|(class_id, width, height)| format!("{class_id} 0.5 0.5 {width} {height}"));
    prop::collection::vec(
        (0..SPLIT_NAMES.len(), prop::collection::vec(line, 0..4)),
        1..8,
    )
    .prop_map(|files| {
        files
            .into_iter()
            .map(|(split, lines)| (split, lines.join("\n")))
            .collect()
    })
}

fn write_dataset(root: &std::path::Path, files: &[(usize, String)]) {
    for (idx, (split, body)) in files.iter().enumerate() {
        let path = root
            .join(SPLIT_NAMES[*split])
            .join("labels")
            .join(format!("f{idx}.txt"));
        std::fs::create_dir_all(path.parent().expect("label parent")).expect("create labels dir");
        std::fs::write(path, body).expect("write label");
    }
}

fn aggregate(root: &std::path::Path, splits: &[Split]) -> MetricsTable {
    MetricsAggregator::new(&DatasetLayout::new(root))
        .with_sink(&NullSink)
        .compute(splits)
        .expect("compute")
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn aggregation_ignores_visit_order(
        (records, shuffled) in prop::collection::vec(arb_record(), 1..40)
            .prop_flat_map(|records| {
                let shuffled = Just(records.clone()).prop_shuffle();
                (Just(records), shuffled)
            })
    ) {
        let mut forward = MetricsAccumulator::new();
        for (stem, record) in &records {
            forward.observe(stem, record);
        }

        let mut permuted = MetricsAccumulator::new();
        for (stem, record) in &shuffled {
            permuted.observe(stem, record);
        }

        prop_assert_eq!(forward.finish(), permuted.finish());
    }

    #[test]
    fn aggregation_ignores_file_visit_order(
        (files, moved) in arb_label_files().prop_flat_map(|files| {
            let count = files.len();
            (Just(files), prop::collection::vec(0..SPLIT_NAMES.len(), count))
        }),
        split_order in Just(SPLIT_NAMES.to_vec()).prop_shuffle(),
    ) {
        let splits: Vec<Split> = SPLIT_NAMES.iter().map(|s| Split::from(*s)).collect();
        let reordered: Vec<Split> = split_order.iter().map(|s| Split::from(*s)).collect();

        let original = tempfile::tempdir().expect("create temp dir");
        write_dataset(original.path(), &files);

        // Same file bodies and stems, placed in different splits.
        let relocated_files: Vec<(usize, String)> = files
            .iter()
            .zip(&moved)
            .map(|((_, body), split)| (*split, body.clone()))
            .collect();
        let relocated = tempfile::tempdir().expect("create temp dir");
        write_dataset(relocated.path(), &relocated_files);

        let expected = aggregate(original.path(), &splits);
        prop_assert_eq!(&aggregate(original.path(), &reordered), &expected);
        prop_assert_eq!(&aggregate(relocated.path(), &splits), &expected);
    }

    #[test]
    fn center_tokens_are_not_read(
        class_id in 0u32..100,
        center in "[a-z]{1,4}",
        width in 0.0f64..=1.0,
        height in 0.0f64..=1.0,
    ) {
        let line = format!("{class_id} {center} {center} {width} {height}");
        match parse_record(&line) {
            LineOutcome::Record(record) => {
                prop_assert_eq!(record.class_id, class_id as f64);
                prop_assert_eq!(record.width, width);
                prop_assert_eq!(record.height, height);
            }
            LineOutcome::Skip(reason) => prop_assert!(false, "unexpected skip: {}", reason),
        }
    }

    #[test]
    fn five_numeric_tokens_always_parse(
        class_id in 0u32..100,
        values in prop::array::uniform4(0.0f64..=1.0),
    ) {
        let line = format!(
            "{} {} {} {} {}",
            class_id, values[0], values[1], values[2], values[3]
        );

        match parse_record(&line) {
            LineOutcome::Record(record) => {
                prop_assert_eq!(record.width, values[2]);
                prop_assert_eq!(record.height, values[3]);
                prop_assert_eq!(record.area(), values[2] * values[3]);
                let expected_ratio = if values[3] > 0.0 { values[2] / values[3] } else { 0.0 };
                prop_assert_eq!(record.aspect_ratio(), expected_ratio);
            }
            LineOutcome::Skip(reason) => prop_assert!(false, "unexpected skip: {}", reason),
        }
    }

    #[test]
    fn wrong_token_counts_are_skipped(tokens in prop::collection::vec("[0-9]\\.[0-9]", 0..10)) {
        prop_assume!(tokens.len() != 5);
        let line = tokens.join(" ");
        prop_assert!(matches!(parse_record(&line), LineOutcome::Skip(_)));
    }

    #[test]
    fn classification_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(classify(low) <= classify(high));
    }
}

#[test]
fn classification_boundaries() {
    assert_eq!(classify(0.02), SizeClass::Medium);
    assert_eq!(classify(0.15), SizeClass::Large);
    assert_eq!(classify(0.0199), SizeClass::Small);
}
