use rand::rngs::StdRng;
use rand::SeedableRng;
use yutnori_core::dice::{roll_with, BACK_STEP_VALUE, THROW_OUTCOMES};

#[test]
fn back_step_never_appears_when_disallowed() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for _ in 0..1000 {
        let outcome = roll_with(&mut rng, false);
        assert_ne!(outcome.value, BACK_STEP_VALUE);
    }
}

#[test]
fn every_outcome_appears_when_allowed() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut seen = [false; 6];
    for _ in 0..10_000 {
        let outcome = roll_with(&mut rng, true);
        let index = THROW_OUTCOMES
            .iter()
            .position(|candidate| candidate.value == outcome.value)
            .expect("outcome from the table");
        seen[index] = true;
    }
    assert!(seen.iter().all(|&found| found));
}

#[test]
fn outcome_table_shape() {
    assert_eq!(THROW_OUTCOMES.len(), 6);
    let extras: Vec<i8> = THROW_OUTCOMES
        .iter()
        .filter(|outcome| outcome.extra)
        .map(|outcome| outcome.value)
        .collect();
    assert_eq!(extras, vec![4, 5]);
    assert_eq!(
        THROW_OUTCOMES
            .iter()
            .filter(|outcome| outcome.value == BACK_STEP_VALUE)
            .count(),
        1
    );
}
