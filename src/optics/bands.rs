//! Spectral band bookkeeping.

use ndarray::{Array2, ArrayView2, Axis, NdFloat};
use smallvec::SmallVec;

use crate::error::CloudOpticsError;

/// The spectral bands the optical properties are resolved over.
///
/// Each band is a `[lower, upper]` pair of wavenumbers in cm⁻¹. The limits are
/// kept for bookkeeping, the cloud optics arithmetic only needs the number of
/// bands.
#[derive(Debug, Clone)]
pub struct SpectralBands<T> {
    /// Wavenumber limits, with a length of `nband`.
    limits: SmallVec<[[T; 2]; 16]>,
}

impl<T: NdFloat> SpectralBands<T> {
    /// Build the band set from limits dimensioned as (`nband`, 2).
    pub fn new(band_lims_wvn: ArrayView2<'_, T>) -> Result<Self, CloudOpticsError> {
        if band_lims_wvn.ncols() != 2 || band_lims_wvn.nrows() == 0 {
            return Err(CloudOpticsError::InvalidBandLimits);
        }

        let limits: SmallVec<[[T; 2]; 16]> = band_lims_wvn
            .axis_iter(Axis(0))
            .map(|band| [band[0], band[1]])
            .collect();

        let valid = limits
            .iter()
            .all(|&[lower, upper]| lower.is_finite() && upper.is_finite() && lower <= upper);
        if !valid {
            return Err(CloudOpticsError::InvalidBandLimits);
        }

        Ok(Self { limits })
    }

    /// Number of bands.
    pub fn nband(&self) -> usize {
        self.limits.len()
    }

    /// Wavenumber limits for each band.
    pub fn limits(&self) -> &[[T; 2]] {
        &self.limits
    }

    /// Wavenumber limits as an array dimensioned as (`nband`, 2).
    pub fn band_lims_wvn(&self) -> Array2<T> {
        Array2::from_shape_fn((self.nband(), 2), |(band, side)| self.limits[band][side])
    }
}
