//! Piecewise-linear interpolation over the particle size axis.

use ndarray::{ArrayView2, ArrayViewMut3, Axis, NdFloat, Zip};

use super::Phase;
use crate::error::CloudOpticsError;

/// How sizes outside of a table's bounds are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizeExtrapolation {
    /// Extend the first or last table segment linearly. Sizes past the upper
    /// bound (or below the lower bound) give extrapolated values.
    #[default]
    Linear,
    /// Clamp sizes to the table bounds, so values never leave the range
    /// spanned by the first and last table rows.
    Clamp,
}

/// Evenly spaced particle size axis of a lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeGrid<T> {
    /// Number of grid points, at least 2.
    nsteps: usize,
    /// Distance between grid points, always positive.
    step_size: T,
    /// Size at the first grid point.
    lower_bound: T,
    /// Size at the last grid point.
    upper_bound: T,
    /// Index of the last grid point, `nsteps - 1`.
    last_point: T,
    /// Index of the last segment's lower grid point, `nsteps - 2`.
    last_segment: T,
}

impl<T: NdFloat> SizeGrid<T> {
    /// Build a grid of `nsteps` points spanning `lower_bound..=upper_bound`.
    pub fn new(
        phase: Phase,
        nsteps: usize,
        lower_bound: T,
        upper_bound: T,
    ) -> Result<Self, CloudOpticsError> {
        if nsteps < 2 {
            return Err(CloudOpticsError::TooFewSizeSteps { phase, nsteps });
        }

        let (last_point, last_segment) = num_traits::cast::<_, T>(nsteps - 1)
            .zip(num_traits::cast::<_, T>(nsteps - 2))
            .ok_or(CloudOpticsError::InvalidStepSize { phase })?;

        let step_size = (upper_bound - lower_bound) / last_point;
        if !(step_size.is_finite() && step_size > T::zero()) {
            return Err(CloudOpticsError::InvalidStepSize { phase });
        }

        Ok(Self {
            nsteps,
            step_size,
            lower_bound,
            upper_bound,
            last_point,
            last_segment,
        })
    }

    /// Number of grid points.
    pub fn nsteps(&self) -> usize {
        self.nsteps
    }

    /// Distance between grid points.
    pub fn step_size(&self) -> T {
        self.step_size
    }

    /// Size at the first grid point.
    pub fn lower_bound(&self) -> T {
        self.lower_bound
    }

    /// Size at the last grid point.
    pub fn upper_bound(&self) -> T {
        self.upper_bound
    }

    /// Locate `size` on the grid.
    ///
    /// Returns the tuple (`index`, `fint`) where `index` is the zero-based
    /// lower grid point of the segment to interpolate on and `fint` is the
    /// fractional offset from it, in units of `step_size`. The index is always
    /// in `0..nsteps - 1` so that `index + 1` is a valid row, whatever `size`
    /// is. With [`SizeExtrapolation::Linear`], `fint` is left unclamped and
    /// may be negative or larger than one.
    pub fn position(&self, size: T, extrapolation: SizeExtrapolation) -> (usize, T) {
        let mut raw = (size - self.lower_bound) / self.step_size;
        // A NaN size stays NaN in both modes
        if extrapolation == SizeExtrapolation::Clamp && !raw.is_nan() {
            raw = raw.max(T::zero()).min(self.last_point);
        }

        // Float `max`/`min` drop a NaN operand, so `lower` is always a valid
        // segment index
        let lower = raw.floor().max(T::zero()).min(self.last_segment);
        let fint = raw - lower;

        (lower.to_usize().unwrap_or(0), fint)
    }
}

/// Interpolate a lookup table at every (column, layer).
///
/// `mask` and `size` are dimensioned as (`ncol`, `nlay`), `table` as
/// (`nsteps`, `nbnd`), and `out` as (`ncol`, `nlay`, `nbnd`). Where `mask` is
/// false, all bands of `out` are set to zero. Elsewhere each band is linearly
/// interpolated between the two table rows bracketing `size`.
pub fn compute_from_table<T: NdFloat>(
    mask: ArrayView2<'_, bool>,
    size: ArrayView2<'_, T>,
    grid: &SizeGrid<T>,
    table: ArrayView2<'_, T>,
    extrapolation: SizeExtrapolation,
    mut out: ArrayViewMut3<'_, T>,
) -> Result<(), CloudOpticsError> {
    let (ncol, nlay, nbnd) = out.dim();
    if size.dim() != (ncol, nlay) {
        return Err(CloudOpticsError::InconsistentInputs { field: "size" });
    }
    if mask.dim() != (ncol, nlay) {
        return Err(CloudOpticsError::InconsistentInputs { field: "mask" });
    }
    if table.dim() != (grid.nsteps(), nbnd) {
        return Err(CloudOpticsError::InconsistentInputs { field: "table" });
    }

    Zip::from(out.lanes_mut(Axis(2)))
        .and(mask)
        .and(size)
        .par_for_each(|mut out, &mask, &size| {
            if !mask {
                out.fill(T::zero());
                return;
            }

            let (index, fint) = grid.position(size, extrapolation);
            Zip::from(&mut out)
                .and(table.row(index))
                .and(table.row(index + 1))
                .for_each(|out, &lower, &upper| {
                    *out = lower + fint * (upper - lower);
                });
        });

    Ok(())
}
