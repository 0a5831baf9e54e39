//! Random `state` values for correlating a callback with its authorization
//! request.

use rand::Rng;

/// Number of random bytes behind a generated state (two hex digits each).
const STATE_BYTES: usize = 8;

/// Generate a 16-character lowercase hex state string.
pub fn generate_state() -> String {
    generate_state_with(&mut rand::thread_rng())
}

/// Generate a state string from `rng`.
pub fn generate_state_with<R: Rng>(rng: &mut R) -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rng.fill(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_is_sixteen_hex_characters() {
        let state = generate_state();
        assert_eq!(state.len(), 16);
        assert!(state.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn states_differ_between_calls() {
        assert_ne!(generate_state(), generate_state());
    }
}
