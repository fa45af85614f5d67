//! Room code generation.

use lobbyforge_protocol::{ProtocolError, RoomCode};
use rand::Rng;

/// Letters codes are drawn from before upper-casing. Both cases of a
/// letter collapse to the same character, so codes stay uniform over A-Z.
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Produces candidate room codes.
///
/// Candidates may collide with existing rooms; the router checks each one
/// against the store and asks again.
pub trait CodeSource: Send + Sync + 'static {
    fn next_code(&self) -> Result<RoomCode, ProtocolError>;
}

/// Uniformly random letter codes from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodes;

impl CodeSource for RandomCodes {
    fn next_code(&self) -> Result<RoomCode, ProtocolError> {
        generate_code(&mut rand::rng())
    }
}

/// Draws [`RoomCode::LENGTH`] letters from `rng`.
pub fn generate_code<R: Rng + ?Sized>(
    rng: &mut R,
) -> Result<RoomCode, ProtocolError> {
    let raw: String = (0..RoomCode::LENGTH)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect();
    RoomCode::parse(&raw)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generate_code_shape() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let code = generate_code(&mut rng).unwrap();
            assert_eq!(code.as_str().len(), RoomCode::LENGTH);
            assert!(code.as_str().bytes().all(|b| b.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_random_codes_vary() {
        let codes: HashSet<_> =
            (0..50).map(|_| RandomCodes.next_code().unwrap()).collect();
        // 26^4 possibilities; 50 draws landing on one value means the
        // generator is broken.
        assert!(codes.len() > 1);
    }
}
