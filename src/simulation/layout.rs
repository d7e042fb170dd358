//! Procedural target layouts
//!
//! Every entity gets two fixed destinations: a point on a spiral cone (the
//! tree) and a point on a spherical shell around it (the scatter field).

use std::f32::consts::PI;

use cgmath::Vector3;
use rand::Rng;

use crate::config::{LayoutConfig, ParticleConfig};

/// The pair of destinations an entity blends between
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutTargets {
    pub tree: Vector3<f32>,
    pub scatter: Vector3<f32>,
}

#[derive(Debug, Clone)]
pub struct LayoutGenerator {
    tree_height: f32,
    tree_radius: f32,
    config: LayoutConfig,
}

impl LayoutGenerator {
    pub fn new(particles: &ParticleConfig, layout: &LayoutConfig) -> Self {
        Self {
            tree_height: particles.tree_height,
            tree_radius: particles.tree_radius,
            config: layout.clone(),
        }
    }

    /// Samples both destinations for one entity
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, is_dust: bool) -> LayoutTargets {
        LayoutTargets {
            tree: self.tree_position(rng),
            scatter: self.scatter_position(rng, is_dust),
        }
    }

    /// A point on the tree cone, denser toward the base
    pub fn tree_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector3<f32> {
        let t = rng.random::<f32>().powf(self.config.height_bias);
        let y = t * self.tree_height - self.tree_height / 2.0;

        let r_max = (self.tree_radius * (1.0 - t)).max(self.config.min_radius);
        let angle = t * self.config.spiral + rng.random::<f32>() * PI;
        let r = r_max * rng.random_range(self.config.jitter.clone());

        Vector3::new(angle.cos() * r, y, angle.sin() * r)
    }

    /// A point uniformly distributed over directions, at a radius drawn from
    /// the dust or regular scatter range
    pub fn scatter_position<R: Rng + ?Sized>(&self, rng: &mut R, is_dust: bool) -> Vector3<f32> {
        let range = if is_dust {
            self.config.dust_scatter_radius.clone()
        } else {
            self.config.scatter_radius.clone()
        };
        let radius = rng.random_range(range);
        let theta = rng.random::<f32>() * PI * 2.0;
        let phi = (2.0 * rng.random::<f32>() - 1.0).acos();

        Vector3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
        )
    }

    pub fn tree_height(&self) -> f32 {
        self.tree_height
    }
}
