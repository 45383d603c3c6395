use rand::Rng;
use rkyv::{Archive, Deserialize, Serialize};

pub const BACK_STEP_VALUE: i8 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrowOutcome {
    pub label: &'static str,
    pub value: i8,
    pub extra: bool,
}

pub const THROW_OUTCOMES: [ThrowOutcome; 6] = [
    ThrowOutcome { label: "do", value: 1, extra: false },
    ThrowOutcome { label: "gae", value: 2, extra: false },
    ThrowOutcome { label: "geol", value: 3, extra: false },
    ThrowOutcome { label: "yut", value: 4, extra: true },
    ThrowOutcome { label: "mo", value: 5, extra: true },
    ThrowOutcome { label: "back-do", value: BACK_STEP_VALUE, extra: false },
];

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct ThrowResult {
    pub label: String,
    pub value: i8,
    pub extra: bool,
}

impl From<ThrowOutcome> for ThrowResult {
    fn from(outcome: ThrowOutcome) -> Self {
        Self {
            label: outcome.label.to_string(),
            value: outcome.value,
            extra: outcome.extra,
        }
    }
}

pub fn roll_with<R: Rng + ?Sized>(rng: &mut R, allow_back_step: bool) -> ThrowOutcome {
    let candidates: Vec<ThrowOutcome> = THROW_OUTCOMES
        .iter()
        .copied()
        .filter(|outcome| allow_back_step || outcome.value != BACK_STEP_VALUE)
        .collect();
    candidates[rng.random_range(0..candidates.len())]
}

pub fn roll(allow_back_step: bool) -> ThrowOutcome {
    roll_with(&mut rand::rng(), allow_back_step)
}
