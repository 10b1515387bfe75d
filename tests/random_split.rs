use molsplit::rng::{DeterministicRng, permutation};
use molsplit::{RandomSplitter, SplitError, SplitLabel, SplitRatios, Splitter, split_balance};

#[test]
fn random_split_is_pinned_for_seed() {
    let split = RandomSplitter
        .train_valid_test_split(10, SplitRatios::default(), Some(42))
        .unwrap();
    assert_eq!(split.validation, vec![8]);
    assert_eq!(split.test, vec![6]);
    assert_eq!(split.train, vec![2, 1, 0, 4, 7, 9, 3, 5]);

    // validation, test, then train read straight off the seeded permutation
    let order = permutation((0..10).collect::<Vec<usize>>(), Some(42));
    assert_eq!(order[0], 8);
    assert_eq!(order[1], 6);
}

#[test]
fn random_split_fills_targets_exactly() {
    let ratios = SplitRatios::new(0.5, 0.3, 0.2);
    for n in [0_usize, 1, 9, 50, 257] {
        let split = RandomSplitter
            .train_valid_test_split(n, ratios, Some(n as u64))
            .unwrap();
        assert_eq!(split.validation.len(), (0.3 * n as f64).floor() as usize);
        assert_eq!(split.test.len(), (0.2 * n as f64).floor() as usize);
        assert_eq!(split.len(), n);
        assert!(split.assignments(n).is_ok());

        let balance = split_balance(&split, ratios);
        assert_eq!(balance.get(SplitLabel::Validation).unwrap().shortfall, 0);
        assert_eq!(balance.get(SplitLabel::Test).unwrap().shortfall, 0);
    }
}

#[test]
fn random_split_depends_on_seed() {
    let ratios = SplitRatios::default();
    let a = RandomSplitter
        .train_valid_test_split(200, ratios, Some(1))
        .unwrap();
    let b = RandomSplitter
        .train_valid_test_split(200, ratios, Some(1))
        .unwrap();
    let c = RandomSplitter
        .train_valid_test_split(200, ratios, Some(2))
        .unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn random_two_way_split() {
    let (train, validation) = RandomSplitter
        .train_valid_split(30, 0.9, 0.1, Some(8))
        .unwrap();
    assert_eq!(train.len(), 27);
    assert_eq!(validation.len(), 3);

    let err = RandomSplitter
        .train_valid_split(30, 0.9, 0.2, Some(8))
        .unwrap_err();
    assert!(matches!(err, SplitError::InvalidArgument(_)));
}

#[test]
fn rng_state_resumes_stream() {
    use rand::RngCore;

    let mut rng = DeterministicRng::new(5);
    rng.next_u64();
    let mut resumed = DeterministicRng::new(rng.state());
    assert_eq!(rng.next_u64(), resumed.next_u64());
}
