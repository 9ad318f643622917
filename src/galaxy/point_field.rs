use super::GalaxyParameters;
use bevy::prelude::*;
use rand::prelude::*;
use rayon::prelude::*;
use std::f32::consts::TAU;

/// Points sampled per parallel chunk. Each chunk owns its own RNG stream,
/// so the output only depends on the seed and not on thread scheduling.
const CHUNK_SIZE: usize = 4096;

/// Per-point attributes of one generated galaxy.
///
/// The three sequences are always the same length and index `i` across all of
/// them describes one point. Only the generator can build one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointField {
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
    scales: Vec<f32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct GalaxyPoint {
    position: Vec3,
    color: Vec3,
    scale: f32,
}

impl PointField {
    /// Samples a field sequentially from `rng`. The same source state always yields
    /// the same field.
    pub fn generate<R: Rng + ?Sized>(params: &GalaxyParameters, rng: &mut R) -> Self {
        let sampler = PointSampler::new(params);
        Self::from_points((0..params.count).map(|index| sampler.sample(index, rng)))
    }

    /// Samples a field in parallel. Chunk `k` draws from a `StdRng` seeded with
    /// `seed + k`, so the same seed always yields the same field.
    pub fn generate_seeded(params: &GalaxyParameters, seed: u64) -> Self {
        let sampler = PointSampler::new(params);
        let mut points = vec![GalaxyPoint::default(); params.count as usize];

        points
            .par_chunks_mut(CHUNK_SIZE)
            .enumerate()
            .for_each(|(chunk_index, chunk)| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(chunk_index as u64));
                let first = chunk_index * CHUNK_SIZE;
                for (offset, point) in chunk.iter_mut().enumerate() {
                    *point = sampler.sample((first + offset) as u32, &mut rng);
                }
            });

        Self::from_points(points)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Linear RGB.
    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    fn from_points(points: impl IntoIterator<Item = GalaxyPoint>) -> Self {
        let iter = points.into_iter();
        let (lower, _) = iter.size_hint();
        let mut field = PointField {
            positions: Vec::with_capacity(lower),
            colors: Vec::with_capacity(lower),
            scales: Vec::with_capacity(lower),
        };
        for point in iter {
            field.positions.push(point.position.to_array());
            field.colors.push(point.color.to_array());
            field.scales.push(point.scale);
        }
        field
    }
}

/// Linear RGB gradient keyed by normalized radius.
#[derive(Clone, Copy, Debug)]
pub struct ColorRamp {
    inside: Vec3,
    outside: Vec3,
}

impl ColorRamp {
    pub fn new(inside: Color, outside: Color) -> Self {
        Self {
            inside: linear_rgb(inside),
            outside: linear_rgb(outside),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.inside.lerp(self.outside, t)
    }
}

fn linear_rgb(color: Color) -> Vec3 {
    let LinearRgba {
        red, green, blue, ..
    } = color.to_linear();
    vec3(red, green, blue)
}

/// The per-point sampling step, with the parameter-derived constants hoisted out.
struct PointSampler {
    radius: f32,
    branches: u32,
    spin: f32,
    randomness: f32,
    randomness_power: f32,
    ramp: ColorRamp,
}

impl PointSampler {
    fn new(params: &GalaxyParameters) -> Self {
        Self {
            radius: params.radius,
            // zero branches would divide by zero; treat it as a single arm
            branches: params.branches.max(1),
            spin: params.spin,
            randomness: params.randomness,
            randomness_power: params.randomness_power,
            ramp: ColorRamp::new(params.inside_color, params.outside_color),
        }
    }

    fn sample<R: Rng + ?Sized>(&self, index: u32, rng: &mut R) -> GalaxyPoint {
        // uniform in radius rather than in area
        let radius = rng.random::<f32>() * self.radius;

        let spin_angle = radius * self.spin;
        let branch_angle = (index % self.branches) as f32 / self.branches as f32 * TAU;
        let angle = branch_angle + spin_angle;

        let jitter = vec3(self.jitter(rng), self.jitter(rng), self.jitter(rng));
        let position = vec3(angle.cos() * radius, 0.0, angle.sin() * radius) + jitter;

        let t = if self.radius != 0.0 {
            (radius / self.radius).clamp(0.0, 1.0)
        } else {
            0.0
        };

        GalaxyPoint {
            position,
            color: self.ramp.at(t),
            scale: rng.random::<f32>(),
        }
    }

    /// Same absolute range at every radius, concentrated near zero for powers above 1.
    fn jitter<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let magnitude = rng.random::<f32>().powf(self.randomness_power);
        let sign = if rng.random::<f32>() < 0.5 { 1.0 } else { -1.0 };
        magnitude * sign * self.randomness
    }
}
