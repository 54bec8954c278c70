mod gf256;

use gf256::GF256;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use zeroize::Zeroize;

#[derive(Debug, Error)]
pub enum ShamirError {
    #[error("shares must be between 2 and 255")]
    InvalidShareCount,
    #[error("threshold must be between 2 and 255")]
    InvalidThreshold,
    #[error("shares cannot be less than threshold")]
    SharesLessThanThreshold,
    #[error("secret cannot be empty")]
    EmptySecret,
    #[error("shares must contain unique indices")]
    DuplicateShares,
    #[error("all shares must have the same length")]
    InconsistentShareLength,
    #[error("share index must be non-zero")]
    InvalidShareIdentifier,
}

/// Share represents a single share from the Shamir Secret Sharing scheme
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Share {
    pub id: u8,
    pub data: Vec<u8>,
}

/// Split a secret into n shares, requiring k shares to reconstruct.
///
/// Shares are evaluated at x = 1..=n. For every byte of the secret an
/// independent random polynomial of degree k-1 is drawn, so no correlations
/// exist between byte positions. A seed may be supplied for reproducible
/// test vectors; production callers pass `None` and get a ChaCha20 generator
/// seeded from the OS.
pub fn split(
    secret: &[u8],
    shares: usize,
    threshold: usize,
    rng_seed: Option<[u8; 32]>,
) -> Result<Vec<Share>, ShamirError> {
    if shares < 2 || shares > 255 {
        return Err(ShamirError::InvalidShareCount);
    }
    if threshold < 2 || threshold > 255 {
        return Err(ShamirError::InvalidThreshold);
    }
    if shares < threshold {
        return Err(ShamirError::SharesLessThanThreshold);
    }
    if secret.is_empty() {
        return Err(ShamirError::EmptySecret);
    }

    let mut rng = match rng_seed {
        Some(seed) => ChaCha20Rng::from_seed(seed),
        None => ChaCha20Rng::from_entropy(),
    };

    let degree = threshold - 1;
    let mut shares_result: Vec<Share> = (1..=shares as u8)
        .map(|x| Share {
            id: x,
            data: Vec::with_capacity(secret.len()),
        })
        .collect();

    for byte in secret {
        // coefficients[0] is the secret byte, the rest are fresh randomness
        let mut coefficients = vec![*byte];
        for _ in 0..degree {
            coefficients.push(rng.gen());
        }

        for share in shares_result.iter_mut() {
            let x = GF256::new(share.id);

            // Horner's method, highest-order coefficient first
            let mut result = GF256::new(0);
            for &coeff in coefficients.iter().rev() {
                result = result * x + GF256::new(coeff);
            }

            share.data.push(result.value());
        }

        coefficients.zeroize();
    }

    Ok(shares_result)
}

/// Combine shares to recover the original secret.
///
/// This is a pure interpolation at x = 0: given fewer shares than the
/// original threshold, or shares from different splits, it deterministically
/// produces a *different* byte sequence rather than an error. Detecting that
/// outcome is the caller's job (the AEAD tag check, in practice).
pub fn combine(shares: &[Share]) -> Result<Vec<u8>, ShamirError> {
    if shares.len() < 2 {
        return Err(ShamirError::InvalidShareCount);
    }

    let first_len = shares[0].data.len();
    if shares.iter().any(|s| s.data.len() != first_len) {
        return Err(ShamirError::InconsistentShareLength);
    }

    // Duplicate or zero indices would divide by zero in the basis terms;
    // reject them up front.
    let mut seen = std::collections::HashSet::new();
    for share in shares {
        if share.id == 0 {
            return Err(ShamirError::InvalidShareIdentifier);
        }
        if !seen.insert(share.id) {
            return Err(ShamirError::DuplicateShares);
        }
    }

    let mut result = Vec::with_capacity(first_len);

    for byte_idx in 0..first_len {
        let mut value = GF256::new(0);

        // Lagrange interpolation at x = 0
        for (i, share_i) in shares.iter().enumerate() {
            let mut term = GF256::new(1);
            let x_i = GF256::new(share_i.id);

            for (j, share_j) in shares.iter().enumerate() {
                if i == j {
                    continue;
                }

                let x_j = GF256::new(share_j.id);
                let numerator = GF256::new(0) - x_j;
                let denominator = x_i - x_j;
                term = term * (numerator / denominator);
            }

            term = term * GF256::new(share_i.data[byte_idx]);
            value = value + term;
        }

        result.push(value.value());
    }

    Ok(result)
}
