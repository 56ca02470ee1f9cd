//! Selectable registry and ray picking.

use std::cell::RefCell;
use std::rc::Rc;

use glam::DVec3;

use crate::celestial::{CelestialSurface, Ray};

/// Result of a successful pick.
#[derive(Debug, Clone)]
pub struct Pick {
    /// Center name of the hit body.
    pub center: String,
    /// Hit point in body-local coordinates.
    pub local_position: DVec3,
    /// Hit point in world coordinates.
    pub world_position: DVec3,
    /// Distance from the ray origin along the ray.
    pub distance: f64,
}

/// Registry of pickable objects.
///
/// The host feeds pointer rays through [`InputManager::pick`] to find the
/// body under the cursor or controller.
pub struct InputManager {
    selectables: RefCell<Vec<Rc<RefCell<dyn CelestialSurface>>>>,
}

impl InputManager {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            selectables: RefCell::new(Vec::new()),
        })
    }

    pub fn register_selectable(&self, selectable: Rc<RefCell<dyn CelestialSurface>>) {
        self.selectables.borrow_mut().push(selectable);
    }

    pub fn unregister_selectable(&self, selectable: &Rc<RefCell<dyn CelestialSurface>>) {
        self.selectables
            .borrow_mut()
            .retain(|s| !Rc::ptr_eq(s, selectable));
    }

    pub fn is_selectable_registered(&self, selectable: &Rc<RefCell<dyn CelestialSurface>>) -> bool {
        self.selectables
            .borrow()
            .iter()
            .any(|s| Rc::ptr_eq(s, selectable))
    }

    pub fn selectable_count(&self) -> usize {
        self.selectables.borrow().len()
    }

    /// Intersect `ray` with every registered selectable and return the
    /// nearest hit in front of the ray origin.
    pub fn pick(&self, ray: &Ray) -> Option<Pick> {
        let direction = ray.direction.normalize_or(DVec3::X);
        let mut nearest: Option<Pick> = None;

        for selectable in self.selectables.borrow().iter() {
            let selectable = selectable.borrow();
            let Some(local_position) = selectable.intersect(ray) else {
                continue;
            };
            let world_position = selectable
                .world_transform()
                .transform_point3(local_position);
            let distance = (world_position - ray.origin).dot(direction);
            if distance < 0.0 {
                continue;
            }
            if nearest.as_ref().is_none_or(|p| distance < p.distance) {
                nearest = Some(Pick {
                    center: selectable.center_name().to_string(),
                    local_position,
                    world_position,
                    distance,
                });
            }
        }

        nearest
    }
}
