use rand::{rngs::SmallRng, Rng, SeedableRng};

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Issues an email verification token: a random u64 in base 36.
///
/// `SmallRng` is not a cryptographic generator. Tokens are guessable in
/// principle; see DESIGN.md before relying on them for anything else.
pub fn issue_token() -> String {
    let mut rng = SmallRng::from_os_rng();
    // Never zero, so the token is never empty.
    to_base36(rng.random_range(1..=u64::MAX))
}

fn to_base36(mut n: u64) -> String {
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    if digits.is_empty() {
        digits.push(b'0');
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
