//! Cloud optical properties for radiative transfer
//!
//! Optical depth, single-scattering albedo, and asymmetry parameter of liquid
//! and ice clouds, per spectral band, from lookup tables indexed by effective
//! particle radius. See [`CloudOptics`] for the entry points.
//!
//! The Python interface lives in the `python` module and is only built with
//! the `python` feature. It is a thin layer over the Rust API and is the only
//! place that uses `pyo3`.

pub mod error;
pub mod optics;

#[cfg(feature = "python")]
mod python;

pub use error::CloudOpticsError;
pub use optics::{
    AbsorptionProps, CloudOptics, OpticalProps, Phase, SizeExtrapolation, SpectralBands,
    TwoStreamProps,
};
