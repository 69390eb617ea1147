//! Payload generation and the integrity check.

use crate::distribution::Prng;
use crate::error::{Error, Result};
use crate::keystream::Keystream;

/// Generate the payload bytes for key `k`:
///
/// - `check`: length and content are a pure function of `k` alone, via
///   [`Keystream`] seeded with `k` itself, so the same bytes can be
///   regenerated later from `k` with no client-side bookkeeping.
/// - `rand` (and not `check`): length comes from the general PRNG, but
///   content is still `k`-seeded, so two different keys with the same
///   length draw get different bytes.
/// - neither: a `min..=max`-length run of `'x'`, maximally compressible
///   filler.
pub fn generate(k: u64, min: u64, max: u64, check: bool, rand: bool, rng: &mut Prng) -> Vec<u8> {
    if check {
        let mut ks = Keystream::seeded(k);
        let len = ks.between(min, max) as usize;
        let mut buf = vec![0u8; len];
        ks.fill(&mut buf);
        buf
    } else if rand {
        let len = rng.between(min, max) as usize;
        let mut ks = Keystream::seeded(k);
        let mut buf = vec![0u8; len];
        ks.fill(&mut buf);
        buf
    } else {
        let len = rng.between(min, max) as usize;
        vec![b'x'; len]
    }
}

/// Verify a `GET` reply against what `SET` would have produced for the same
/// key, in integrity (`check`) mode.
///
/// Compares the exact returned byte count against the regenerated bytes
/// only, never against a `\r\n`-padded buffer.
pub fn verify(k: u64, min: u64, max: u64, reply: &[u8]) -> Result<()> {
    let mut ks = Keystream::seeded(k);
    let expected_len = ks.between(min, max) as usize;
    let mut expected = vec![0u8; expected_len];
    ks.fill(&mut expected);

    if reply.len() != expected_len {
        return Err(Error::Integrity {
            keyid: k,
            detail: format!(
                "length mismatch: expected {expected_len} bytes, got {}",
                reply.len()
            ),
        });
    }
    if reply != expected.as_slice() {
        return Err(Error::Integrity {
            keyid: k,
            detail: "byte content mismatch".into(),
        });
    }
    Ok(())
}
