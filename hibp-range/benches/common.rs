use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ALL_CHARS: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()_+-=[]{}|;:,.<>?";

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Generates passwords of 8 to 64 printable characters.
/// Uses a fixed seed for reproducible benchmark results.
pub fn generate_random_passwords(count: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| {
            let length = rng.gen_range(8..=64);
            (0..length)
                .map(|_| ALL_CHARS[rng.gen_range(0..ALL_CHARS.len())] as char)
                .collect()
        })
        .collect()
}

/// Builds a range body shaped like a real response: `lines` random 35-char
/// suffixes with counts, joined by `\r\n`.
pub fn generate_range_body(lines: usize) -> String {
    let mut rng = StdRng::seed_from_u64(7);
    (0..lines)
        .map(|_| {
            let suffix: String = (0..35).map(|_| HEX[rng.gen_range(0..16)] as char).collect();
            format!("{suffix}:{}", rng.gen_range(1..100_000u32))
        })
        .collect::<Vec<_>>()
        .join("\r\n")
}
