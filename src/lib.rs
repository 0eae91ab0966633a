//! LumiRay 2-D spectral ray optics simulator
//!
//! Rays carry a discretized intensity spectrum (four wavelength bands,
//! TE/TM polarization) and propagate recursively through a scene of
//! optical objects: mirrors, dielectric interfaces with dispersion,
//! diffusers, filters, paraxial ABCD elements, volumetric fog, energy
//! meters and accumulating screens.

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cli;
pub mod curve;
pub mod error;
pub mod fog;
pub mod geometry;
pub mod logger;
pub mod object;
pub mod ray;
pub mod render;
pub mod scene;
pub mod source;
pub mod spectrum;
pub mod surface;
