//! Solar-system bookkeeping: body registry, radii lookup, Sun queries.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use glam::DVec3;

use orrery_utils::Property;

use crate::celestial::{CelestialAnchor, CelestialSurface};

/// Center name of the Sun; bodies with this center light themselves.
pub const SUN_CENTER_NAME: &str = "Sun";

/// Total luminous power of the Sun in lumens.
const SUN_LUMINOUS_POWER: f64 = 3.75e28;

/// The solar-system service.
///
/// Owns the Sun object, the registry of live celestial bodies, the triaxial
/// radii table, the observer anchor scale, and the current simulation epoch.
/// Shared as `Rc<SolarSystem>` on the render-loop thread.
pub struct SolarSystem {
    radii: RefCell<HashMap<String, DVec3>>,
    bodies: RefCell<Vec<Rc<RefCell<dyn CelestialSurface>>>>,
    sun: Rc<RefCell<CelestialAnchor>>,
    /// Total luminous power of the Sun, lumens. Drives HDR illuminance.
    pub sun_luminous_power: Property<f64>,
    observer_scale: Cell<f64>,
    time: Cell<f64>,
}

impl SolarSystem {
    /// A solar system preloaded with IAU triaxial radii for the major bodies.
    pub fn new() -> Rc<Self> {
        let sun = CelestialAnchor::new(
            SUN_CENTER_NAME,
            "IAU_SUN",
            f64::NEG_INFINITY,
            f64::INFINITY,
        );
        Rc::new(Self {
            radii: RefCell::new(default_radii()),
            bodies: RefCell::new(Vec::new()),
            sun: Rc::new(RefCell::new(sun)),
            sun_luminous_power: Property::new(SUN_LUMINOUS_POWER),
            observer_scale: Cell::new(1.0),
            time: Cell::new(0.0),
        })
    }

    /// Triaxial radii in metres for a center name, if known.
    pub fn radii_of(&self, center_name: &str) -> Option<DVec3> {
        self.radii.borrow().get(center_name).copied()
    }

    /// Insert or replace a radii entry. Mainly used by hosts with bodies
    /// beyond the built-in table.
    pub fn set_radii(&self, center_name: &str, radii: DVec3) {
        self.radii.borrow_mut().insert(center_name.to_string(), radii);
    }

    /// The Sun object. Bodies keep a weak back-reference for lighting.
    pub fn sun(&self) -> Rc<RefCell<CelestialAnchor>> {
        self.sun.clone()
    }

    pub fn register_body(&self, body: Rc<RefCell<dyn CelestialSurface>>) {
        tracing::debug!("Registering body \"{}\"", body.borrow().center_name());
        self.bodies.borrow_mut().push(body);
    }

    pub fn unregister_body(&self, body: &Rc<RefCell<dyn CelestialSurface>>) {
        self.bodies.borrow_mut().retain(|b| !Rc::ptr_eq(b, body));
    }

    pub fn is_body_registered(&self, body: &Rc<RefCell<dyn CelestialSurface>>) -> bool {
        self.bodies.borrow().iter().any(|b| Rc::ptr_eq(b, body))
    }

    pub fn body_by_center(&self, center_name: &str) -> Option<Rc<RefCell<dyn CelestialSurface>>> {
        self.bodies
            .borrow()
            .iter()
            .find(|b| b.borrow().center_name() == center_name)
            .cloned()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.borrow().len()
    }

    /// Center names of all registered bodies, in registration order.
    pub fn body_centers(&self) -> Vec<String> {
        self.bodies
            .borrow()
            .iter()
            .map(|b| b.borrow().center_name().to_string())
            .collect()
    }

    /// Unit vector from `position` toward the Sun, in world space.
    pub fn sun_direction(&self, position: DVec3) -> DVec3 {
        let sun_position = self.sun.borrow().position();
        (sun_position - position).normalize_or(DVec3::X)
    }

    /// Illuminance received from the Sun at `position`, in lux-equivalent
    /// scene units (inverse-square falloff of the luminous power).
    pub fn sun_illuminance(&self, position: DVec3) -> f64 {
        let sun_position = self.sun.borrow().position();
        let distance_sq = (sun_position - position).length_squared().max(f64::MIN_POSITIVE);
        self.sun_luminous_power.get() / (4.0 * std::f64::consts::PI * distance_sq)
    }

    /// Scale of the observer's current anchor: how many scene units one
    /// metre spans near the observer.
    pub fn observer_scale(&self) -> f64 {
        self.observer_scale.get()
    }

    pub fn set_observer_scale(&self, scale: f64) {
        self.observer_scale.set(scale);
    }

    /// Current simulation epoch, seconds past J2000.
    pub fn time(&self) -> f64 {
        self.time.get()
    }

    pub fn set_time(&self, time: f64) {
        self.time.set(time);
    }
}

fn default_radii() -> HashMap<String, DVec3> {
    // IAU mean reference values, metres
    let entries: [(&str, [f64; 3]); 10] = [
        ("Sun", [6.957e8, 6.957e8, 6.957e8]),
        ("Mercury", [2.4397e6, 2.4397e6, 2.4397e6]),
        ("Venus", [6.0518e6, 6.0518e6, 6.0518e6]),
        ("Earth", [6.3781366e6, 6.3781366e6, 6.3567519e6]),
        ("Moon", [1.7374e6, 1.7374e6, 1.7374e6]),
        ("Mars", [3.39619e6, 3.39619e6, 3.3762e6]),
        ("Jupiter", [7.1492e7, 7.1492e7, 6.6854e7]),
        ("Saturn", [6.0268e7, 6.0268e7, 5.4364e7]),
        ("Uranus", [2.5559e7, 2.5559e7, 2.4973e7]),
        ("Neptune", [2.4764e7, 2.4764e7, 2.4341e7]),
    ];
    entries
        .into_iter()
        .map(|(name, [x, y, z])| (name.to_string(), DVec3::new(x, y, z)))
        .collect()
}
