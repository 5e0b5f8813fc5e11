//! Human-shareable session codes

use rand::RngCore;
use rand::rngs::OsRng;

/// Length of a share code
pub const SHARE_CODE_LENGTH: usize = 6;

/// 0-9 and A-Z except for I and O
pub const SHARE_CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Largest multiple of the alphabet size that fits in a byte. Bytes at or
/// above it are rejected so every symbol is equally likely.
const REJECTION_BOUND: u8 = (256 / SHARE_CODE_ALPHABET.len() * SHARE_CODE_ALPHABET.len()) as u8;

/// Generate a share code from the operating system's secure random source
pub fn generate_code() -> Result<String, rand::Error> {
    generate_code_with(&mut OsRng)
}

/// Generate a share code from the given random source, one symbol at a time
pub fn generate_code_with<R: RngCore + ?Sized>(rng: &mut R) -> Result<String, rand::Error> {
    let mut code = String::with_capacity(SHARE_CODE_LENGTH);
    let mut buf = [0u8; 1];
    while code.len() < SHARE_CODE_LENGTH {
        rng.try_fill_bytes(&mut buf)?;
        if buf[0] >= REJECTION_BOUND {
            continue;
        }
        let idx = usize::from(buf[0]) % SHARE_CODE_ALPHABET.len();
        code.push(char::from(SHARE_CODE_ALPHABET[idx]));
    }
    Ok(code)
}

/// Whether `code` has the shape of a share code
pub fn is_valid_code(code: &str) -> bool {
    code.len() == SHARE_CODE_LENGTH && code.bytes().all(|b| SHARE_CODE_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn alphabet_excludes_ambiguous_letters() {
        assert_eq!(SHARE_CODE_ALPHABET.len(), 34);
        assert!(!SHARE_CODE_ALPHABET.contains(&b'I'));
        assert!(!SHARE_CODE_ALPHABET.contains(&b'O'));
        let unique: HashSet<_> = SHARE_CODE_ALPHABET.iter().collect();
        assert_eq!(unique.len(), SHARE_CODE_ALPHABET.len());
    }

    #[test]
    fn rejection_bound_is_multiple_of_alphabet() {
        assert_eq!(usize::from(REJECTION_BOUND) % SHARE_CODE_ALPHABET.len(), 0);
        assert_eq!(REJECTION_BOUND, 238);
    }

    #[test]
    fn generated_codes_are_valid() {
        for _ in 0..500 {
            let code = generate_code().unwrap();
            assert!(is_valid_code(&code), "invalid code: {code}");
        }
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let a = generate_code_with(&mut StdRng::seed_from_u64(7)).unwrap();
        let b = generate_code_with(&mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
        assert!(is_valid_code(&a));
    }

    #[test]
    fn generation_covers_the_alphabet() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = HashSet::new();
        for _ in 0..2_000 {
            seen.extend(generate_code_with(&mut rng).unwrap().bytes());
        }
        assert_eq!(seen.len(), SHARE_CODE_ALPHABET.len());
    }

    #[test]
    fn is_valid_code_rejects_bad_shapes() {
        assert!(is_valid_code("AB12CD"));
        assert!(!is_valid_code("AB12C"));
        assert!(!is_valid_code("AB12CDE"));
        assert!(!is_valid_code("ab12cd"));
        assert!(!is_valid_code("AB12CO"));
        assert!(!is_valid_code("AB1ICD"));
    }
}
