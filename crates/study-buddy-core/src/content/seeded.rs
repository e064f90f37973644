/// Repeatable pseudo-random value in `[0, 1)` derived from `seed`.
///
/// Sums the leading UTF-16 unit of every code point, so astral characters
/// contribute their high surrogate only. Not suitable for anything that
/// needs unpredictability.
pub fn seeded_rand(seed: &str) -> f64 {
    let mut buf = [0u16; 2];
    let sum: u64 = seed
        .chars()
        .map(|c| c.encode_utf16(&mut buf)[0] as u64)
        .sum();
    let t = (sum as f64).sin() * 10_000.0;
    t - t.floor()
}
