//! Degradation synthesis for the denoising tasks.
//!
//! The denoising variants build their low-quality inputs by adding Gaussian
//! noise to the clean image. Randomness comes from an explicit seeded
//! generator passed by the caller — never process-global seed state. Callers
//! that batch over inputs seed a fresh generator per input, so each image's
//! noise field reproduces bit-for-bit regardless of processing order.

use anyhow::{bail, Result};
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Generator for one degradation pass.
pub fn degradation_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Add zero-mean Gaussian noise with standard deviation `sigma / 255` to a
/// `[0, 1]`-range image, in place.
pub fn add_gaussian_noise(image: &mut Array3<f32>, sigma: f32, rng: &mut StdRng) -> Result<()> {
    if !sigma.is_finite() || sigma < 0.0 {
        bail!("noise sigma must be finite and non-negative, got {sigma}");
    }
    let normal = Normal::new(0.0f32, sigma / 255.0)?;
    for v in image.iter_mut() {
        *v += normal.sample(rng);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_reproduces() {
        let clean = Array3::from_elem((3, 8, 8), 0.5);

        let mut a = clean.clone();
        add_gaussian_noise(&mut a, 25.0, &mut degradation_rng(813)).unwrap();

        let mut b = clean.clone();
        add_gaussian_noise(&mut b, 25.0, &mut degradation_rng(813)).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let clean = Array3::from_elem((3, 8, 8), 0.5);

        let mut a = clean.clone();
        add_gaussian_noise(&mut a, 25.0, &mut degradation_rng(0)).unwrap();

        let mut b = clean;
        add_gaussian_noise(&mut b, 25.0, &mut degradation_rng(1)).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let clean = Array3::from_elem((1, 4, 4), 0.25);
        let mut noisy = clean.clone();
        add_gaussian_noise(&mut noisy, 0.0, &mut degradation_rng(7)).unwrap();
        assert_eq!(noisy, clean);
    }

    #[test]
    fn test_negative_sigma_rejected() {
        let mut img = Array3::zeros((1, 4, 4));
        let err = add_gaussian_noise(&mut img, -1.0, &mut degradation_rng(0)).unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }
}
