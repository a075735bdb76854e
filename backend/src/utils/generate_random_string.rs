use rand::{Rng, distributions::Alphanumeric, rngs::OsRng};

/// Generates a random alphanumeric string of the specified length.
///
/// Characters are drawn from the operating system's CSPRNG.
///
/// # Arguments
///
/// * `length` - The desired length of the generated string
pub fn generate_random_string(length: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
