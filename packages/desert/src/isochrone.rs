//! Noise-distorted travel-time rings.
//!
//! A ring is a circle of the band's nominal radius whose radius is
//! perturbed per vertex by a seeded lobe profile: a cosine with two or
//! three periods per turn, its bearing warped by `OpenSimplex2` noise
//! sampled along a closed loop in noise space. The loop keeps the ring
//! seamless where the first and last vertices meet. The warp never turns
//! the bearing backwards, so the lobe count survives the distortion.
//!
//! The noise seed is a hash of the facility's placed coordinate, so a
//! facility always gets the same shape.

use care_map_coverage_models::TravelBand;
use care_map_geography_models::LatLng;
use care_map_spatial::offset_by_km;
use fastnoise_lite::{FastNoiseLite, NoiseType};
use xxhash_rust::xxh32::xxh32;

/// Salt mixed into every coordinate hash.
const SEED_SALT: u32 = 0x6361_7265;

const NOISE_FREQUENCY: f32 = 0.4;

/// Radius of the loop traced through noise space.
const NOISE_LOOP_RADIUS: f32 = 1.0;

/// Largest bearing warp in radians. Together with the frequency and loop
/// radius this keeps the warp's slope below one.
const WARP_RADIANS: f64 = 0.3;

/// Smallest ring a vertex step may produce.
const MIN_VERTICES: usize = 8;

/// Noise seed for a ring centered on `center`.
///
/// `-0.0` and `0.0` hash identically.
#[must_use]
pub fn ring_seed(center: LatLng) -> u32 {
    let (lat, lng) = center.bits_key();
    let mut bytes = [0_u8; 16];
    bytes[..8].copy_from_slice(&lat.to_le_bytes());
    bytes[8..].copy_from_slice(&lng.to_le_bytes());
    xxh32(&bytes, SEED_SALT)
}

/// Number of vertices a ring sampled every `vertex_step_deg` degrees has,
/// or `None` if the step is unusable.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn vertex_count(vertex_step_deg: f64) -> Option<usize> {
    if !vertex_step_deg.is_finite() || vertex_step_deg <= 0.0 {
        return None;
    }
    let count = (360.0 / vertex_step_deg).round() as usize;
    (count >= MIN_VERTICES).then_some(count)
}

/// Seeded angular noise for one facility.
///
/// Every band of a facility samples the same profile, so the rings stay
/// nested as long as outer bands have the larger radius at full
/// contraction.
pub struct RingNoise {
    noise: FastNoiseLite,
    lobes: u32,
    phase: f64,
}

impl RingNoise {
    /// Noise profile for `seed`. The low bit picks two or three lobes and
    /// the high 24 bits pick where the first lobe points.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn new(seed: u32) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed as i32);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(NOISE_FREQUENCY));
        Self {
            noise,
            lobes: 2 + (seed & 1),
            phase: std::f64::consts::TAU * f64::from(seed >> 8) / f64::from(1_u32 << 24),
        }
    }

    /// Number of outward bulges the profile has per turn.
    #[must_use]
    pub const fn lobes(&self) -> u32 {
        self.lobes
    }

    /// Noise value in `[-1, 1]` at bearing `theta` (radians).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn sample(&self, theta: f64) -> f64 {
        let x = theta.cos() as f32 * NOISE_LOOP_RADIUS;
        let y = theta.sin() as f32 * NOISE_LOOP_RADIUS;
        let warp = WARP_RADIANS * f64::from(self.noise.get_noise_2d(x, y));
        f64::from(self.lobes)
            .mul_add(theta + warp, self.phase)
            .cos()
    }
}

/// Boundary of `band` around `center`, one vertex per angular step,
/// starting due north and running clockwise. The ring is not closed.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn distorted_ring(
    center: LatLng,
    band: &TravelBand,
    noise: &RingNoise,
    vertices: usize,
) -> Vec<LatLng> {
    let radius_km = band.radius_km();
    (0..vertices)
        .map(|i| {
            let theta = std::f64::consts::TAU * i as f64 / vertices as f64;
            let radius = radius_km * band.distortion.mul_add(noise.sample(theta), 1.0);
            offset_by_km(center, radius, theta)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use care_map_spatial::distance_km;

    use super::*;

    fn band() -> TravelBand {
        TravelBand::new("60 min", 60.0, 50.0, 0.25)
    }

    #[test]
    fn five_degree_step_gives_72_vertices() {
        assert_eq!(vertex_count(5.0), Some(72));
        assert_eq!(vertex_count(0.0), None);
        assert_eq!(vertex_count(f64::NAN), None);
        assert_eq!(vertex_count(90.0), None);
    }

    #[test]
    fn seeds_depend_on_the_coordinate_only() {
        let a = LatLng::new(5.6037, -0.187);
        assert_eq!(ring_seed(a), ring_seed(LatLng::new(5.6037, -0.187)));
        assert_ne!(ring_seed(a), ring_seed(LatLng::new(5.6037, -0.1871)));
        assert_eq!(ring_seed(LatLng::new(0.0, -0.0)), ring_seed(LatLng::new(0.0, 0.0)));
    }

    #[test]
    fn regenerating_a_ring_is_bit_identical() {
        let center = LatLng::new(6.6885, -1.6244);
        let first = distorted_ring(center, &band(), &RingNoise::new(ring_seed(center)), 72);
        let second = distorted_ring(center, &band(), &RingNoise::new(ring_seed(center)), 72);
        assert_eq!(first.len(), 72);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.bits_key(), b.bits_key());
        }
    }

    #[test]
    fn radius_stays_within_the_distortion_bound() {
        let center = LatLng::new(7.9465, -1.0232);
        let band = band();
        let ring = distorted_ring(center, &band, &RingNoise::new(ring_seed(center)), 72);
        let nominal = band.radius_km();
        for vertex in ring {
            let d = distance_km(center, vertex);
            // Planar projection is within a fraction of a percent at this range.
            assert!(d >= nominal * (1.0 - band.distortion) * 0.99, "{d} km too close");
            assert!(d <= nominal * (1.0 + band.distortion) * 1.01, "{d} km too far");
        }
    }

    #[test]
    fn rings_are_not_perfect_circles() {
        let center = LatLng::new(9.4008, -0.8393);
        let noise = RingNoise::new(ring_seed(center));
        let samples: Vec<f64> = (0..72)
            .map(|i| noise.sample(std::f64::consts::TAU * f64::from(i) / 72.0))
            .collect();
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(max - min > 0.05, "noise range {min}..{max} is flat");
    }

    fn local_maxima(samples: &[f64]) -> usize {
        let n = samples.len();
        (0..n)
            .filter(|&i| {
                let prev = samples[(i + n - 1) % n];
                let next = samples[(i + 1) % n];
                samples[i] > prev && samples[i] >= next
            })
            .count()
    }

    #[test]
    fn every_ring_has_two_or_three_lobes() {
        let mut seen = [false; 2];
        for lat in [4.9, 5.6037, 6.6885, 7.9465, 9.4008, 10.7856] {
            for lng in [-3.0, -1.75, -0.8393, -0.187, 0.47] {
                let noise = RingNoise::new(ring_seed(LatLng::new(lat, lng)));
                let samples: Vec<f64> = (0..72)
                    .map(|i| noise.sample(std::f64::consts::TAU * f64::from(i) / 72.0))
                    .collect();
                let lobes = local_maxima(&samples);
                assert_eq!(lobes, noise.lobes() as usize, "({lat}, {lng})");
                assert!((2..=3).contains(&lobes), "({lat}, {lng}) has {lobes} lobes");
                seen[lobes - 2] = true;
            }
        }
        assert_eq!(seen, [true, true], "both lobe counts occur");
    }

    #[test]
    fn outer_bands_enclose_inner_bands() {
        let center = LatLng::new(5.6037, -0.187);
        let noise = RingNoise::new(ring_seed(center));
        let bands = TravelBand::defaults();
        let rings: Vec<Vec<LatLng>> = bands
            .iter()
            .map(|band| distorted_ring(center, band, &noise, 72))
            .collect();
        for pair in rings.windows(2) {
            for (inner, outer) in pair[0].iter().zip(&pair[1]) {
                assert!(distance_km(center, *inner) < distance_km(center, *outer));
            }
        }
    }
}
