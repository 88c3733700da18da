// tests/search_tests.rs

//! End-to-end staged runs against the test backends.

use qkeyscan::core::constants::lambda::UNIFORM_PRIOR_LAMBDA;
use qkeyscan::core::Register;
use qkeyscan::search::report::CSV_HEADER;
use qkeyscan::{
    Circuit, ControllerState, CsvReport, PermutedXorScrambler, Predicate, QuasiDistribution, RunReport, Scrambler,
    SearchConfig, SearchError, StagedSearch, XorScrambler,
};

mod common;
use common::{init_logging, FailingBackend, ScriptedBackend, StateVectorBackend, TEST_TOLERANCE};

const PLAIN: u64 = 0b1011_0000;
const KEY: u64 = 0b0100_1101;

fn xor_problem(n: usize, plain: u64, key: u64) -> Result<Predicate, SearchError> {
    let cipher = XorScrambler.checked_scramble(n, plain, key)?;
    XorScrambler.build_predicate(n, plain, cipher)
}

/// Mass of outcomes whose mirror or ancilla bits are not all zero.
fn dirty_mass(register: &Register, distribution: &QuasiDistribution) -> f64 {
    distribution
        .iter()
        .filter(|(outcome, _)| outcome >> register.index_width() != 0)
        .map(|(_, p)| p)
        .sum()
}

#[test]
fn eight_bit_predicate_selects_only_the_key() -> Result<(), SearchError> {
    for scrambler in [&XorScrambler as &dyn Scrambler, &PermutedXorScrambler::default()] {
        let cipher = scrambler.checked_scramble(8, PLAIN, KEY)?;
        let predicate = scrambler.build_predicate(8, PLAIN, cipher)?;
        let accepted: Vec<u64> = (0..256u64).filter(|k| predicate.accepts(*k).unwrap_or(false)).collect();
        assert_eq!(accepted, vec![KEY]);
    }
    Ok(())
}

#[test]
fn first_stage_is_exact_on_half_weight() -> Result<(), SearchError> {
    init_logging();
    let n = 4;
    let key = 0b0110;
    let predicate = xor_problem(n, 0b1011, key)?;
    let mut search = StagedSearch::new(SearchConfig::with_index_width(n), StateVectorBackend::exact())?;
    search.step(&predicate)?;

    assert_eq!(search.stages()[0].lambda, UNIFORM_PRIOR_LAMBDA);
    assert_eq!(search.stages()[0].iterations, 1);
    let backend = search.into_backend();
    let first = &backend.history[0];
    // One Grover-Long iteration at weight 1/2 puts all mass on key bit 0.
    let wrong_bit: f64 = first.iter().filter(|(o, _)| (o ^ key) & 1 != 0).map(|(_, p)| p).sum();
    assert!(wrong_bit < TEST_TOLERANCE, "mass on wrong bit 0: {}", wrong_bit);
    assert!((first.total_mass() - 1.0).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn every_stage_restores_mirror_and_ancilla() -> Result<(), SearchError> {
    let n = 3;
    let predicate = xor_problem(n, 0b101, 0b011)?;
    let mut search = StagedSearch::new(SearchConfig::with_index_width(n), StateVectorBackend::exact())?;
    search.run(&predicate)?;
    let register = *search.register();
    let backend = search.into_backend();
    assert_eq!(backend.history.len(), n);
    for distribution in &backend.history {
        assert!(dirty_mass(&register, distribution) < TEST_TOLERANCE);
    }
    Ok(())
}

#[test]
fn four_bit_search_recovers_the_key() -> Result<(), SearchError> {
    init_logging();
    let (n, plain, key) = (4, 0b1011, 0b0110);
    let predicate = xor_problem(n, plain, key)?;
    let mut search = StagedSearch::new(SearchConfig::with_index_width(n), StateVectorBackend::exact())?;
    let outcome = search.run(&predicate)?;

    assert_eq!(search.state(), ControllerState::Done);
    assert_eq!(outcome.stages().len(), n);
    assert_eq!(outcome.stages()[0].lambda, 0.5);
    let total: usize = outcome.stages().iter().map(|s| s.iterations).sum();
    assert_eq!(outcome.sum_iterations(), total);
    assert!(outcome.stages().iter().all(|s| s.lambda > 0.0 && s.lambda <= 0.6));
    // Entropy falls as key bits are pinned down.
    assert!(outcome.final_entropy() < outcome.stages()[0].entropy);

    assert_eq!(outcome.final_state().most_likely_key(), key);
    assert!(outcome.success_probability(key) > 0.8);
    assert!(outcome.success_probability(key ^ 1) < 0.1);
    Ok(())
}

#[test]
fn eight_bit_search_with_permuted_cipher() -> Result<(), SearchError> {
    init_logging();
    let scrambler = PermutedXorScrambler::default();
    let cipher = scrambler.checked_scramble(8, PLAIN, KEY)?;
    let predicate = scrambler.build_predicate(8, PLAIN, cipher)?;
    let config = SearchConfig::with_index_width(8).shots(1000);
    let mut search = StagedSearch::new(config, StateVectorBackend::exact())?;
    let outcome = search.run(&predicate)?;

    assert_eq!(outcome.stages().len(), 8);
    assert_eq!(outcome.final_state().most_likely_key(), KEY);
    assert!(outcome.report(KEY).probability > 0.5);
    Ok(())
}

#[test]
fn too_few_shots_flatten_the_model() -> Result<(), SearchError> {
    // Stage 1 spreads the mass over 128 outcomes, each estimated below one
    // shot, so every count truncates to zero and the model carries no
    // information.
    let predicate = xor_problem(8, PLAIN, KEY)?;
    let mut search = StagedSearch::new(SearchConfig::with_index_width(8).shots(100), StateVectorBackend::exact())?;
    search.step(&predicate)?;
    let floor = qkeyscan::estimator::min_weight(100);
    let expected = 8.0 * -(floor * floor.log2() + (1.0 - floor) * (1.0 - floor).log2());
    assert!((search.stages()[0].entropy - expected).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn sampled_runs_are_reproducible() -> Result<(), SearchError> {
    let predicate = xor_problem(3, 0b101, 0b011)?;
    let config = SearchConfig::with_index_width(3).shots(200);
    let first = StagedSearch::new(config.clone(), StateVectorBackend::sampled(42))?.run(&predicate)?;
    let second = StagedSearch::new(config, StateVectorBackend::sampled(42))?.run(&predicate)?;
    assert_eq!(first, second);

    let dist = first.final_distribution();
    assert!((dist.total_mass() - 1.0).abs() < TEST_TOLERANCE);
    for (_, p) in dist.iter() {
        assert!(p > 0.0 && p <= 1.0);
        // Sampled frequencies are multiples of 1/shots.
        assert!((p * 200.0 - (p * 200.0).round()).abs() < TEST_TOLERANCE);
    }
    let probability = first.success_probability(0b011);
    assert!((0.0..=1.0).contains(&probability));
    Ok(())
}

#[test]
fn stage_one_uses_prior_regardless_of_script() -> Result<(), SearchError> {
    let n = 2;
    let sharp: QuasiDistribution = [(0b10, 1.0)].into_iter().collect();
    let backend = ScriptedBackend::new(vec![sharp.clone(), sharp]);
    let mut search = StagedSearch::new(SearchConfig::with_index_width(n).shots(30), backend)?;
    let outcome = search.run(&xor_problem(n, 0b01, 0b10)?)?;

    assert_eq!(outcome.stages()[0].lambda, 0.5);
    assert_eq!(outcome.stages()[1].lambda, 0.6);
    let backend = search.into_backend();
    assert_eq!(backend.calls.len(), 2);
    for (operator, width, shots) in &backend.calls {
        assert_eq!((*width, *shots), (5, 30));
        assert!(Circuit::lower(operator, *width).is_ok());
    }
    Ok(())
}

#[test]
fn backend_failure_propagates_unchanged() -> Result<(), SearchError> {
    let predicate = xor_problem(3, 0b101, 0b011)?;
    let mut search = StagedSearch::new(SearchConfig::with_index_width(3), FailingBackend::new(1))?;
    match search.run(&predicate) {
        Err(SearchError::Backend(inner)) => {
            assert_eq!(inner.to_string(), "device offline on call 1");
            assert!(inner.inner().downcast_ref::<common::TestBackendError>().is_some());
        }
        other => panic!("expected a backend error, got {:?}", other.map(|o| o.sum_iterations())),
    }
    // Stage 1 completed, stage 2 aborted; nothing was retried.
    assert_eq!(search.state(), ControllerState::Running { stage: 1 });
    assert_eq!(search.stages().len(), 1);
    assert_eq!(search.into_backend().calls, 2);
    Ok(())
}

#[test]
fn script_exhaustion_is_a_backend_error() -> Result<(), SearchError> {
    let backend = ScriptedBackend::new(Vec::new());
    let mut search = StagedSearch::new(SearchConfig::with_index_width(2), backend)?;
    assert!(matches!(search.run(&xor_problem(2, 0, 1)?), Err(SearchError::Backend(_))));
    Ok(())
}

#[test]
fn repeated_runs_append_to_csv() -> Result<(), SearchError> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("sampler.csv");
    let (n, key) = (3, 0b011);
    let predicate = xor_problem(n, 0b101, key)?;
    let config = SearchConfig::with_index_width(n).repeats(2);

    let mut search = StagedSearch::new(config.clone(), StateVectorBackend::exact())?;
    let mut sink = CsvReport::open_append(&path)?;
    let outcomes = search.run_repeated(&predicate, key, &mut sink)?;
    drop(sink);
    let mut search = StagedSearch::new(config, StateVectorBackend::exact())?;
    let mut sink = CsvReport::open_append(&path)?;
    search.run_repeated(&predicate, key, &mut sink)?;
    drop(sink);

    let text = std::fs::read_to_string(&path)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], CSV_HEADER);
    let expected: RunReport = outcomes[0].report(key);
    for line in &lines[1..] {
        assert_eq!(*line, expected.to_csv_row());
    }
    Ok(())
}
