use glam::Vec3;

use crate::{error::SceneError, material::Material};

/// Sphere capacity of the shader's uniform block.
pub const MAX_CAPACITY: usize = 20;

/// Smallest radius an edit may leave behind.
pub const MIN_RADIUS: f32 = 0.01;

/// Scene primitive, 64 bytes in the shader's layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Sphere {
    pub material: Material,

    pub position: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(material: Material, position: Vec3, radius: f32) -> Self {
        Self {
            material,
            position,
            radius: radius.max(MIN_RADIUS),
        }
    }

    pub fn sanitize(&mut self) {
        self.material.sanitize();
        if !(self.radius >= MIN_RADIUS) || !self.radius.is_finite() {
            self.radius = MIN_RADIUS;
        }
        if !self.position.is_finite() {
            self.position = Vec3::ZERO;
        }
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            material: Material::default(),
            position: Vec3::ZERO,
            radius: 1.0,
        }
    }
}

/// Bounded, insertion-ordered sphere collection with a single selection slot.
///
/// The store knows nothing about accumulation; callers reset it after edits.
#[derive(Debug)]
pub struct SceneStore {
    spheres: Vec<Sphere>,
    capacity: usize,
    selected: Option<usize>,
}

impl SceneStore {
    /// Capacities above [`MAX_CAPACITY`] are lowered to it.
    pub fn with_capacity(capacity: usize) -> Self {
        if capacity > MAX_CAPACITY {
            tracing::warn!(
                requested = capacity,
                max = MAX_CAPACITY,
                "scene capacity limited by the renderer"
            );
        }
        let capacity = capacity.min(MAX_CAPACITY);
        Self {
            spheres: Vec::with_capacity(capacity),
            capacity,
            selected: None,
        }
    }

    /// The four-sphere world: ground, area light, diffuse ball and mirror ball.
    pub fn demo_world() -> Self {
        let mut store = Self::default();
        let orange = Material::diffuse(Vec3::new(0.9, 0.5, 0.0), 1.0, 0.5);
        let blue = Material::diffuse(Vec3::new(0.1, 0.95, 0.8), 1.0, 0.5);
        let mirror = Material::mirror(1.0);
        let light = Material::light(Vec3::ONE, 20.0);

        for sphere in [
            Sphere::new(blue, Vec3::new(0.0, -2000.0, 0.0), 2000.0),
            Sphere::new(light, Vec3::new(-4.3, 14.0, -15.5), 7.0),
            Sphere::new(orange, Vec3::new(0.0, 1.0, 0.0), 1.0),
            Sphere::new(mirror, Vec3::new(2.5, 1.5, 0.0), 1.5),
        ] {
            // MAX_CAPACITY leaves plenty of room
            let _ = store.add(sphere);
        }
        store
    }

    pub fn add(&mut self, sphere: Sphere) -> Result<usize, SceneError> {
        if self.spheres.len() >= self.capacity {
            tracing::warn!(capacity = self.capacity, "rejected sphere: scene is full");
            return Err(SceneError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.spheres.push(sphere);
        Ok(self.spheres.len() - 1)
    }

    pub fn get(&self, index: usize) -> Result<&Sphere, SceneError> {
        self.spheres.get(index).ok_or(SceneError::IndexOutOfRange {
            index,
            count: self.spheres.len(),
        })
    }

    /// In-place access for edits. The caller owns the accumulation reset.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut Sphere, SceneError> {
        let count = self.spheres.len();
        self.spheres
            .get_mut(index)
            .ok_or(SceneError::IndexOutOfRange { index, count })
    }

    /// Select a sphere, or clear the selection with `None`.
    ///
    /// An out-of-range index clears the selection and is reported back.
    pub fn set_selected(&mut self, index: Option<usize>) -> Result<(), SceneError> {
        match index {
            Some(index) if index >= self.spheres.len() => {
                self.selected = None;
                Err(SceneError::IndexOutOfRange {
                    index,
                    count: self.spheres.len(),
                })
            }
            index => {
                self.selected = index;
                Ok(())
            }
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected.filter(|&index| index < self.spheres.len())
    }

    pub fn selected(&self) -> Option<&Sphere> {
        self.selected_index().map(|index| &self.spheres[index])
    }

    /// Selection as the shader expects it, -1 for none.
    pub fn selected_tag(&self) -> i32 {
        self.selected_index().map_or(-1, |index| index as i32)
    }

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Byte-for-byte copy of the stored spheres for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.spheres)
    }
}

impl Default for SceneStore {
    fn default() -> Self {
        Self::with_capacity(MAX_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_layout_is_four_rows() {
        assert_eq!(std::mem::size_of::<Sphere>(), 64);
    }

    #[test]
    fn add_returns_insertion_index() {
        let mut store = SceneStore::with_capacity(3);
        assert_eq!(store.add(Sphere::default()), Ok(0));
        assert_eq!(store.add(Sphere::default()), Ok(1));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn add_beyond_capacity_leaves_store_unchanged() {
        let mut store = SceneStore::with_capacity(1);
        store.add(Sphere::default()).unwrap();
        let err = store
            .add(Sphere::new(Material::default(), Vec3::X, 2.0))
            .unwrap_err();
        assert_eq!(err, SceneError::CapacityExceeded { capacity: 1 });
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().radius, 1.0);
    }

    #[test]
    fn get_out_of_range() {
        let store = SceneStore::demo_world();
        assert_eq!(
            store.get(4),
            Err(SceneError::IndexOutOfRange { index: 4, count: 4 })
        );
    }

    #[test]
    fn invalid_selection_clears() {
        let mut store = SceneStore::demo_world();
        store.set_selected(Some(2)).unwrap();
        assert_eq!(store.selected_index(), Some(2));
        assert_eq!(store.selected_tag(), 2);

        assert!(store.set_selected(Some(9)).is_err());
        assert_eq!(store.selected_index(), None);
        assert!(store.selected().is_none());
        assert_eq!(store.selected_tag(), -1);
    }

    #[test]
    fn bytes_cover_only_stored_spheres() {
        let store = SceneStore::demo_world();
        assert_eq!(store.as_bytes().len(), 4 * 64);
    }

    #[test]
    fn sanitize_floors_radius() {
        let mut sphere = Sphere::default();
        sphere.radius = -3.0;
        sphere.sanitize();
        assert_eq!(sphere.radius, MIN_RADIUS);
    }

    #[test]
    fn sanitize_rejects_non_finite_values() {
        let mut sphere = Sphere::new(
            Material::diffuse(Vec3::ONE, f32::NAN, 0.5),
            Vec3::new(f32::NAN, 1.0, 0.0),
            f32::INFINITY,
        );
        sphere.sanitize();
        assert_eq!(sphere.position, Vec3::ZERO);
        assert_eq!(sphere.radius, MIN_RADIUS);
        assert_eq!(sphere.material.roughness, 0.0);

        let mut sphere = Sphere::default();
        sphere.radius = f32::NAN;
        sphere.sanitize();
        assert_eq!(sphere.radius, MIN_RADIUS);
    }

    #[test]
    fn capacity_is_limited_to_uniform_block() {
        let mut store = SceneStore::with_capacity(MAX_CAPACITY + 30);
        assert_eq!(store.capacity(), MAX_CAPACITY);
        for _ in 0..MAX_CAPACITY {
            store.add(Sphere::default()).unwrap();
        }
        assert_eq!(
            store.add(Sphere::default()),
            Err(SceneError::CapacityExceeded {
                capacity: MAX_CAPACITY
            })
        );
        assert_eq!(store.as_bytes().len(), MAX_CAPACITY * 64);
    }
}
