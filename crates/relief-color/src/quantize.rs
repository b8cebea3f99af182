//! K-means color quantization.
//!
//! Clusters pixel colors in RGB space (alpha ignored) into `k` centroids:
//!
//! 1. Seed with distinct colors drawn at random from the pixels, padding with
//!    copies of the last seed when the image has fewer than `k` colors.
//! 2. Assign every pixel to its nearest centroid (ties go to the lower index).
//! 3. Move each centroid to the mean of its pixels; empty clusters stay put.
//! 4. Stop once no centroid moved by `convergence_epsilon` or more, or after
//!    `max_iterations`. Hitting the cap is reported, not an error.
//!
//! Centroids come back in seeding order, not sorted.

use hashbrown::HashSet;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::color::{Rgb, RgbF};
use crate::error::{ColorError, ColorResult};
use crate::palette::{Palette, QuantizedImage};
use crate::pixels::PixelBuffer;

/// Smallest supported cluster count.
pub const MIN_CLUSTERS: usize = 2;
/// Largest supported cluster count.
pub const MAX_CLUSTERS: usize = 8;

/// Parameters for k-means clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansParams {
    /// Number of clusters, in `[MIN_CLUSTERS, MAX_CLUSTERS]`.
    pub k: usize,
    /// Hard iteration cap.
    pub max_iterations: usize,
    /// Largest centroid movement (0–255 scale) still counted as converged.
    pub convergence_epsilon: f64,
    /// Seed for centroid initialization; `None` draws from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            k: 4,
            max_iterations: 100,
            convergence_epsilon: 1.0,
            seed: None,
        }
    }
}

impl KMeansParams {
    pub fn with_k(k: usize) -> Self {
        Self {
            k,
            ..Self::default()
        }
    }

    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> ColorResult<()> {
        if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&self.k) {
            return Err(ColorError::ClusterCount {
                k: self.k,
                min: MIN_CLUSTERS,
                max: MAX_CLUSTERS,
            });
        }
        if self.max_iterations == 0 {
            return Err(ColorError::invalid_param("max_iterations", 0, "must be at least 1"));
        }
        if !self.convergence_epsilon.is_finite() || self.convergence_epsilon < 0.0 {
            return Err(ColorError::invalid_param(
                "convergence_epsilon",
                self.convergence_epsilon,
                "must be a finite non-negative number",
            ));
        }
        Ok(())
    }
}

/// Per-iteration progress of a clustering run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationStats {
    /// 1-based iteration number.
    pub iteration: usize,
    /// Within-cluster sum of squared distances for this iteration's assignment.
    pub inertia: f64,
    /// Largest centroid movement during this iteration's update.
    pub max_shift: f64,
}

/// Result of a clustering run.
#[derive(Debug, Clone)]
pub struct Quantization {
    /// Exact cluster centers, in seeding order.
    pub centers: Vec<RgbF>,
    /// Centers rounded to 8-bit colors; always `k` entries.
    pub centroids: Vec<Rgb>,
    /// Cluster index of every pixel against the final centers.
    pub assignments: Vec<u8>,
    /// Number of assign/update rounds performed.
    pub iterations: usize,
    /// Whether the movement threshold was reached before the cap.
    pub converged: bool,
    /// Inertia of every round, in order. Non-increasing.
    pub inertia: Vec<f64>,
    /// Distinct colors found while seeding (less than `k` means padding).
    pub distinct_seeds: usize,
}

impl Quantization {
    /// Whether seeding had to duplicate centroids.
    pub fn is_padded(&self) -> bool {
        self.distinct_seeds < self.centroids.len()
    }

    /// Replace every pixel by its rounded centroid; alpha becomes opaque.
    ///
    /// The palette is the centroid list. Each pixel's rank is the first
    /// palette entry equal to its centroid color, so clusters that round to
    /// the same color share a layer.
    pub fn to_image(&self, source: &PixelBuffer) -> ColorResult<QuantizedImage> {
        let palette = Palette::new(self.centroids.clone())?;
        let canonical: Vec<u8> = self
            .centroids
            .iter()
            .map(|&c| palette.index_of(c).unwrap_or(0) as u8)
            .collect();

        let pixels = PixelBuffer::from_colors(
            source.width(),
            source.height(),
            self.assignments.iter().map(|&a| self.centroids[a as usize]),
        )?;
        let indices = self
            .assignments
            .iter()
            .map(|&a| Some(canonical[a as usize]))
            .collect();

        QuantizedImage::from_parts(pixels, palette, indices)
    }
}

/// Cluster the colors of `pixels` into `params.k` centroids.
pub fn quantize(pixels: &PixelBuffer, params: &KMeansParams) -> ColorResult<Quantization> {
    quantize_observed(pixels, params, &mut |_| {})
}

/// Like [`quantize`], calling `observer` after every iteration.
pub fn quantize_observed(
    pixels: &PixelBuffer,
    params: &KMeansParams,
    observer: &mut dyn FnMut(IterationStats),
) -> ColorResult<Quantization> {
    params.validate()?;

    let mut rng: Box<dyn RngCore> = if let Some(seed) = params.seed {
        Box::new(StdRng::seed_from_u64(seed))
    } else {
        Box::new(rand::thread_rng())
    };

    info!(
        "Quantizing {}x{} image to {} colors",
        pixels.width(),
        pixels.height(),
        params.k
    );

    let (seeds, distinct_seeds) = seed_centroids(pixels, params.k, &mut *rng);
    if distinct_seeds < params.k {
        warn!(
            "Image has only {} distinct colors for k = {}; padding with duplicate centroids",
            distinct_seeds, params.k
        );
    }

    let points: Vec<RgbF> = pixels.colors().map(Rgb::to_f64).collect();
    let mut result = run_kmeans(&points, seeds, params, observer);
    result.distinct_seeds = distinct_seeds;

    if result.converged {
        info!("K-means converged after {} iterations", result.iterations);
    } else {
        warn!(
            "K-means reached {} iterations without converging; using last centroids",
            params.max_iterations
        );
    }
    debug!(
        "Centroids: {:?}",
        result.centroids.iter().map(|c| c.to_hex()).collect::<Vec<_>>()
    );

    Ok(result)
}

/// Draw distinct colors in random order until `k` are found or every pixel
/// has been visited, then pad by repeating the last one.
///
/// Returns the seeds and the number of distinct colors found.
fn seed_centroids<R: Rng + ?Sized>(pixels: &PixelBuffer, k: usize, rng: &mut R) -> (Vec<RgbF>, usize) {
    let n = pixels.pixel_count();
    let mut order: Vec<u32> = (0..n as u32).collect();
    let mut seen: HashSet<Rgb> = HashSet::with_capacity(k);
    let mut seeds: Vec<Rgb> = Vec::with_capacity(k);

    // Lazy Fisher-Yates: only shuffle as far as needed.
    for i in 0..n {
        let j = rng.gen_range(i..n);
        order.swap(i, j);
        let color = pixels.color(order[i] as usize);
        if seen.insert(color) {
            seeds.push(color);
            if seeds.len() == k {
                break;
            }
        }
    }

    let distinct = seeds.len();
    let last = seeds.last().copied().unwrap_or(Rgb::BLACK);
    seeds.resize(k, last);

    (seeds.into_iter().map(Rgb::to_f64).collect(), distinct)
}

/// Index and squared distance of the nearest center; ties keep the first.
#[inline]
fn nearest(p: RgbF, centers: &[RgbF]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centers.iter().enumerate() {
        let d = p.dist_sq(*c);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

fn run_kmeans(
    points: &[RgbF],
    mut centers: Vec<RgbF>,
    params: &KMeansParams,
    observer: &mut dyn FnMut(IterationStats),
) -> Quantization {
    let k = centers.len();
    let mut counts = vec![0usize; k];
    let mut sums = vec![RgbF::default(); k];
    let mut inertia_history = Vec::new();
    let mut converged = false;
    let mut iterations = 0;

    while iterations < params.max_iterations {
        counts.fill(0);
        sums.fill(RgbF::default());
        let mut inertia = 0.0;

        for p in points {
            let (c, d) = nearest(*p, &centers);
            counts[c] += 1;
            sums[c] = sums[c] + *p;
            inertia += d;
        }
        inertia_history.push(inertia);

        let mut max_shift: f64 = 0.0;
        for i in 0..k {
            if counts[i] > 0 {
                let updated = sums[i] * (1.0 / counts[i] as f64);
                max_shift = max_shift.max(updated.dist(centers[i]));
                centers[i] = updated;
            }
        }
        iterations += 1;

        debug!(
            "K-means iteration {}: inertia = {:.1}, max shift = {:.3}",
            iterations, inertia, max_shift
        );
        observer(IterationStats {
            iteration: iterations,
            inertia,
            max_shift,
        });

        if max_shift < params.convergence_epsilon {
            converged = true;
            break;
        }
    }

    let assignments = points.iter().map(|p| nearest(*p, &centers).0 as u8).collect();

    Quantization {
        centroids: centers.iter().map(|c| c.to_rgb()).collect(),
        centers,
        assignments,
        iterations,
        converged,
        inertia: inertia_history,
        distinct_seeds: k,
    }
}
