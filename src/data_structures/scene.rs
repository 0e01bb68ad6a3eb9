//! The scene collection: an ordered list of primitives with their transform
//! and material, plus the angle accumulator that spins them.

use cgmath::{Deg, InnerSpace, Rotation3, Vector3};
use rand::{RngExt, SeedableRng, rngs::StdRng};
use serde::Deserialize;

use crate::{data_structures::instance::Instance, resources::texture::TEXTURE_SLOTS};

/// Built-in geometry an item can be drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Triangle,
    Quad,
    Cube,
}

impl Primitive {
    pub const ALL: [Primitive; 3] = [Primitive::Triangle, Primitive::Quad, Primitive::Cube];
}

/// Surface description of a scene item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// RGBA, each channel in `[0, 1]`.
    pub color: [f32; 4],
    /// Texture slot sampled by the item, `None` for colour only.
    pub texture_slot: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SceneItem {
    pub primitive: Primitive,
    pub instance: Instance,
    pub material: Material,
}

/// Translations of the first ten items.
pub const CUBE_POSITIONS: [[f32; 3]; 10] = [
    [0.0, 0.0, 0.0],
    [2.0, 5.0, -15.0],
    [-1.5, -2.2, -2.5],
    [-3.8, -2.0, -12.3],
    [2.4, -0.4, -3.5],
    [-1.7, 3.0, -7.5],
    [1.3, -2.0, -2.5],
    [1.5, 2.0, -2.5],
    [1.5, 0.2, -1.5],
    [-1.3, 1.0, -1.5],
];

const RING_SIZE: usize = 12;

/// Extra rotation per item index.
const STAGGER: Deg<f32> = Deg(20.0);

#[derive(Debug)]
pub struct Scene {
    items: Vec<SceneItem>,
    angle: Deg<f32>,
    /// Angle accumulator speed in degrees per second.
    spin: Deg<f32>,
    rng: StdRng,
}

impl Scene {
    /// A scene seeded from the clock.
    pub fn new(spin: Deg<f32>) -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::with_seed(spin, seed)
    }

    /// A scene with a reproducible colour sequence.
    pub fn with_seed(spin: Deg<f32>, seed: u64) -> Self {
        Self {
            items: Vec::new(),
            angle: Deg(0.0),
            spin,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Appends an item with the identity transform and a random opaque colour.
    ///
    /// Texture slots are handed out round-robin.
    pub fn add_item(&mut self, primitive: Primitive) -> &SceneItem {
        let color = [
            self.rng.random_range(0.0..=1.0f32),
            self.rng.random_range(0.0..=1.0f32),
            self.rng.random_range(0.0..=1.0f32),
            1.0,
        ];
        let texture_slot = Some(self.items.len() as u32 % TEXTURE_SLOTS);
        let index = self.items.len();
        self.items.push(SceneItem {
            primitive,
            instance: Instance::new(),
            material: Material {
                color,
                texture_slot,
            },
        });
        log::info!(
            "added {:?} #{} (colour {:.2?}, slot {:?})",
            primitive,
            index,
            color,
            texture_slot
        );
        &self.items[index]
    }

    /// Advances the angle accumulator and recomputes every item's transform.
    pub fn update(&mut self, dt: std::time::Duration) {
        self.angle += self.spin * dt.as_secs_f32();
        let axis = Vector3::new(0.5, 1.0, 0.0).normalize();
        for (i, item) in self.items.iter_mut().enumerate() {
            item.instance.position = Self::slot_offset(i);
            item.instance.rotation =
                cgmath::Quaternion::from_axis_angle(axis, self.angle + STAGGER * i as f32);
        }
    }

    /// Translation of item `index`: the classic ten positions, then rings of
    /// twelve receding into the screen.
    pub fn slot_offset(index: usize) -> Vector3<f32> {
        if let Some(position) = CUBE_POSITIONS.get(index) {
            return (*position).into();
        }
        let k = index - CUBE_POSITIONS.len();
        let ring = (k / RING_SIZE) as f32;
        let step = (k % RING_SIZE) as f32;
        let theta = cgmath::Rad::from(Deg(step * 360.0 / RING_SIZE as f32)).0;
        let radius = 4.0 + ring * 2.0;
        Vector3::new(
            radius * theta.cos(),
            radius * theta.sin(),
            -6.0 - ring * 3.0,
        )
    }

    pub fn angle(&self) -> Deg<f32> {
        self.angle
    }

    pub fn items(&self) -> &[SceneItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
