//! Scene object abstraction.
//!
//! The capability set of an object is: test a ray for interception (giving
//! the nearest hit with its squared travel distance), re-emit zero or more
//! child rays from a hit, and report an approximate bounding extension.
//! Geometry variants (line, arc, composite) are paired with interchangeable
//! interaction surfaces by composition in [`crate::surface::Optic`]; the
//! volumetric fog medium is its own variant.
//!
//! Intercept records are a tagged sum carrying exactly the fields each
//! interaction needs. They are produced by `test_intercept`, consumed by
//! `re_emit` on the same object, and never persisted.

use glam::Vec2;
use rand::Rng;
use smallvec::SmallVec;

use crate::fog::Fog;
use crate::ray::Ray;
use crate::surface::Optic;

/// Interception data for a ray hitting a curve (line, arc, or a composite
/// constituent).
#[derive(Debug, Clone)]
pub struct CurveHit {
    /// Incidence point.
    pub point: Vec2,
    /// Incidence angle of the ray relative to the local normal.
    pub incidence: f32,
    /// Absolute angle of the local normal to the horizontal.
    pub normal_angle: f32,
    /// Orientation flag: true when the ray arrives on the forward face of
    /// the (oriented) curve.
    pub forward: bool,
    /// Curve-specific position of the hit.
    pub detail: CurveDetail,
}

/// Curve-specific hit position.
#[derive(Debug, Clone)]
pub enum CurveDetail {
    /// Hit on a segment: abscissa in [0, 1] measured from `b` toward `a`.
    Segment {
        /// Parametric position on the segment.
        s: f32,
    },
    /// Hit on a circular arc: absolute angle of the incidence point on the
    /// circle, to the horizontal.
    Arc {
        /// Absolute incidence angle on the circle.
        theta: f32,
    },
}

/// Interception data for a ray scattered inside a volumetric medium.
#[derive(Debug, Clone)]
pub struct ScatterHit {
    /// Scatter point.
    pub point: Vec2,
    /// Grid cell indices of the scatter point.
    pub cell: (i32, i32),
    /// Fraction of the intensity that keeps travelling straight through.
    pub transmitted: f32,
}

/// Transient, per-interaction intercept record.
#[derive(Debug, Clone)]
pub enum Intercept {
    /// Hit on a curve object.
    Curve(CurveHit),
    /// Scatter event inside a volumetric medium.
    Scatter(ScatterHit),
}

impl Intercept {
    /// Physical incidence/scatter point, for drawing.
    pub fn point(&self) -> Vec2 {
        match self {
            Intercept::Curve(hit) => hit.point,
            Intercept::Scatter(hit) => hit.point,
        }
    }
}

/// Result of a successful interception test.
#[derive(Debug, Clone)]
pub struct Hit {
    /// Squared distance travelled by the ray from its origin to the hit.
    pub dist_sq: f32,
    /// The intercept record to hand back to `re_emit`.
    pub intercept: Intercept,
}

/// Pessimistic bounding extension of an object: a disk guaranteed to
/// contain it. Hint only; the scene scan does not use it for pruning.
#[derive(Debug, Clone, Copy)]
pub struct Extension {
    /// Center of the bounding disk.
    pub pos: Vec2,
    /// Radius of the bounding disk.
    pub radius: f32,
}

/// Child rays produced by one re-emission. Most interactions emit 0–2 rays;
/// diffusers and fog may spill to the heap.
pub type Emission = SmallVec<[Ray; 4]>;

/// An object of the scene: an optic (curve geometry × interaction surface)
/// or a volumetric fog medium.
pub enum SceneObject {
    /// Curve object with an interaction surface.
    Optic(Optic),
    /// Volumetric scattering medium.
    Fog(Fog),
}

impl SceneObject {
    /// Test the ray for interception; `None` when the object does not
    /// intercept it. The RNG feeds the fog's stochastic walk; curve optics
    /// ignore it.
    pub fn test_intercept<R: Rng>(&self, ray: &Ray, rng: &mut R) -> Option<Hit> {
        match self {
            SceneObject::Optic(optic) => optic.test_intercept(ray),
            SceneObject::Fog(fog) => fog.test_intercept(ray, rng),
        }
    }

    /// Re-emit the intercepted ray as zero or more child rays.
    ///
    /// `intercept` must come from a `test_intercept` call on this same
    /// object for the same ray; a mismatched record kind emits nothing.
    pub fn re_emit<R: Rng>(&mut self, ray: &Ray, intercept: &Intercept, rng: &mut R) -> Emission {
        match (self, intercept) {
            (SceneObject::Optic(optic), Intercept::Curve(hit)) => optic.re_emit(ray, hit, rng),
            (SceneObject::Fog(fog), Intercept::Scatter(hit)) => fog.re_emit(ray, hit, rng),
            _ => Emission::new(),
        }
    }

    /// Approximate bounding extension.
    pub fn extension(&self) -> Extension {
        match self {
            SceneObject::Optic(optic) => optic.extension(),
            SceneObject::Fog(fog) => fog.extension(),
        }
    }

    /// The optic behind this object, if it is one.
    pub fn as_optic(&self) -> Option<&Optic> {
        match self {
            SceneObject::Optic(optic) => Some(optic),
            SceneObject::Fog(_) => None,
        }
    }

    /// Mutable access to the optic behind this object, if it is one.
    pub fn as_optic_mut(&mut self) -> Option<&mut Optic> {
        match self {
            SceneObject::Optic(optic) => Some(optic),
            SceneObject::Fog(_) => None,
        }
    }

    /// The fog behind this object, if it is one.
    pub fn as_fog(&self) -> Option<&Fog> {
        match self {
            SceneObject::Optic(_) => None,
            SceneObject::Fog(fog) => Some(fog),
        }
    }
}

impl From<Optic> for SceneObject {
    fn from(optic: Optic) -> SceneObject {
        SceneObject::Optic(optic)
    }
}

impl From<Fog> for SceneObject {
    fn from(fog: Fog) -> SceneObject {
        SceneObject::Fog(fog)
    }
}
