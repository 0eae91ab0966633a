//! Construction-time validation errors.
//!
//! Covers the fatal configuration errors: degenerate geometry, open
//! composite chains, out-of-range spectral bands, and invalid
//! geometry/surface pairings. Numerical degeneracies during tracing
//! (parallel rays, grazing hits, sub-cutoff intensities) are not errors;
//! they resolve silently as "no interception" or "discard".

use thiserror::Error;

/// Errors raised while building scene objects or spectra.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Spectral band index outside the fixed band table.
    #[error("spectral band index {0} out of range (0..{max})", max = crate::spectrum::N_BANDS)]
    InvalidBand(usize),

    /// Arc-through-two-points construction where the chord exceeds the diameter.
    #[error("arc endpoints farther apart than twice the radius")]
    DegenerateArc,

    /// Composite built from zero curves.
    #[error("composite object has no constituent curves")]
    EmptyComposite,

    /// Composite whose curves do not chain end-to-end into a closed loop.
    #[error("composite curves do not form a closed chain (gap at curve {0})")]
    OpenChain(usize),

    /// Surface that only makes sense on a line geometry (ABCD element, screen)
    /// paired with something else.
    #[error("{0} surface requires a line geometry")]
    LineRequired(&'static str),
}
