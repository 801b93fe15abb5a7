use rand::{distr::Alphanumeric, Rng};

const SHORT_UID_LENGTH: usize = 14;

/// Generate a short random alphanumeric UID for rules submitted without one.
pub fn generate_short_uid() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(SHORT_UID_LENGTH)
        .map(char::from)
        .collect()
}
