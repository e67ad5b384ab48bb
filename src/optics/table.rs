//! Particle size lookup tables.

use log::debug;
use ndarray::{Array2, ArrayView2, ArrayView3, Axis, NdFloat};

use super::{interpolate::SizeGrid, Phase};
use crate::error::CloudOpticsError;

/// Bounds of a lookup table's particle size axis, in µm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeBounds<T> {
    /// Effective radius at the first table row.
    pub lower: T,
    /// Effective radius at the last table row.
    pub upper: T,
    /// Spacing factor shipped with the lookup tables. It isn't used for the
    /// grid, whose spacing follows from the bounds and the number of rows.
    pub factor: T,
}

/// An optical quantity stored in a [`ParticleSizeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// Mass extinction coefficient
    Extinction,
    /// Single-scattering albedo
    SingleScatteringAlbedo,
    /// Asymmetry parameter
    Asymmetry,
}

/// Optical coefficients of one cloud phase on a particle size grid.
///
/// Each table is dimensioned as (`nsteps`, `nbnd`).
#[derive(Debug, Clone)]
pub struct ParticleSizeTable<T> {
    phase: Phase,
    grid: SizeGrid<T>,
    ext: Array2<T>,
    ssa: Array2<T>,
    asy: Array2<T>,
}

impl<T: NdFloat> ParticleSizeTable<T> {
    /// Build a table from coefficients dimensioned as (`nsteps`, `nbnd`).
    ///
    /// The number of size points is taken from `ext`. The other two tables
    /// must have the same shape, and all of them must have `nbnd` bands.
    pub fn new(
        phase: Phase,
        bounds: SizeBounds<T>,
        nbnd: usize,
        ext: Array2<T>,
        ssa: Array2<T>,
        asy: Array2<T>,
    ) -> Result<Self, CloudOpticsError> {
        let (nsteps, table_bands) = ext.dim();
        if ssa.dim() != ext.dim() || asy.dim() != ext.dim() {
            return Err(CloudOpticsError::TableShapeMismatch { phase });
        }
        if table_bands != nbnd {
            return Err(CloudOpticsError::BandMismatch {
                phase,
                expected: nbnd,
                actual: table_bands,
            });
        }

        let grid = SizeGrid::new(phase, nsteps, bounds.lower, bounds.upper)?;
        debug!(
            "{phase} table: {nsteps} sizes from {} to {} (step {}), {nbnd} bands",
            grid.lower_bound(),
            grid.upper_bound(),
            grid.step_size()
        );

        Ok(Self {
            phase,
            grid,
            ext,
            ssa,
            asy,
        })
    }

    /// Build a table from coefficients dimensioned as (`nsteps`, `nbnd`,
    /// `nrough`), keeping only the zero-based roughness category `roughness`.
    pub(crate) fn with_roughness(
        phase: Phase,
        bounds: SizeBounds<T>,
        nbnd: usize,
        ext: ArrayView3<'_, T>,
        ssa: ArrayView3<'_, T>,
        asy: ArrayView3<'_, T>,
        roughness: usize,
    ) -> Result<Self, CloudOpticsError> {
        if ssa.dim() != ext.dim() || asy.dim() != ext.dim() {
            return Err(CloudOpticsError::TableShapeMismatch { phase });
        }
        let available = ext.len_of(Axis(2));
        if roughness >= available {
            return Err(CloudOpticsError::MissingRoughness { available });
        }

        let select = |lut: ArrayView3<'_, T>| lut.index_axis(Axis(2), roughness).to_owned();
        Self::new(phase, bounds, nbnd, select(ext), select(ssa), select(asy))
    }

    /// Phase this table describes.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Particle size axis.
    pub fn grid(&self) -> &SizeGrid<T> {
        &self.grid
    }

    /// Number of bands.
    pub fn nband(&self) -> usize {
        self.ext.ncols()
    }

    /// Coefficients for `quantity`, dimensioned as (`nsteps`, `nbnd`).
    pub fn coefficients(&self, quantity: Quantity) -> ArrayView2<'_, T> {
        match quantity {
            Quantity::Extinction => self.ext.view(),
            Quantity::SingleScatteringAlbedo => self.ssa.view(),
            Quantity::Asymmetry => self.asy.view(),
        }
    }
}
