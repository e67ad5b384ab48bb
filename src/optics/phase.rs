//! Optical properties of a single cloud phase.

use ndarray::{ArrayView2, ArrayViewMut3, Axis, NdFloat, Zip};

use super::{
    interpolate::{compute_from_table, SizeExtrapolation},
    props::{AbsorptionProps, OpticalProps, TwoStreamProps},
    table::{ParticleSizeTable, Quantity},
};
use crate::error::CloudOpticsError;

/// Cloud condensate phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Liquid droplets
    Liquid,
    /// Ice crystals
    Ice,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Liquid => write!(f, "liquid"),
            Phase::Ice => write!(f, "ice"),
        }
    }
}

/// Per-call inputs for one phase, each dimensioned as (`ncol`, `nlay`).
#[derive(Debug, Clone, Copy)]
pub struct PhaseFields<'a, T> {
    /// Where the phase is present.
    pub mask: ArrayView2<'a, bool>,
    /// Condensate path in g/m².
    pub path: ArrayView2<'a, T>,
    /// Effective radius in µm.
    pub size: ArrayView2<'a, T>,
}

/// Optical property representations that can be interpolated out of a
/// [`ParticleSizeTable`].
pub trait FromSizeTable<T: NdFloat>: OpticalProps<T> + Send {
    /// Interpolate the quantities this representation holds. The optical
    /// depth is left as the unscaled extinction coefficient.
    fn interpolate(
        table: &ParticleSizeTable<T>,
        mask: ArrayView2<'_, bool>,
        size: ArrayView2<'_, T>,
        extrapolation: SizeExtrapolation,
    ) -> Result<Self, CloudOpticsError>;
}

impl<T: NdFloat> FromSizeTable<T> for AbsorptionProps<T> {
    fn interpolate(
        table: &ParticleSizeTable<T>,
        mask: ArrayView2<'_, bool>,
        size: ArrayView2<'_, T>,
        extrapolation: SizeExtrapolation,
    ) -> Result<Self, CloudOpticsError> {
        let (ncol, nlay) = size.dim();
        let mut props = Self::zeros(ncol, nlay, table.nband());
        compute_from_table(
            mask,
            size,
            table.grid(),
            table.coefficients(Quantity::Extinction),
            extrapolation,
            props.tau_mut(),
        )?;
        Ok(props)
    }
}

impl<T: NdFloat> FromSizeTable<T> for TwoStreamProps<T> {
    fn interpolate(
        table: &ParticleSizeTable<T>,
        mask: ArrayView2<'_, bool>,
        size: ArrayView2<'_, T>,
        extrapolation: SizeExtrapolation,
    ) -> Result<Self, CloudOpticsError> {
        let (ncol, nlay) = size.dim();
        let mut props = Self::zeros(ncol, nlay, table.nband());
        let (tau, ssa, g) = props.split_mut();

        for (quantity, out) in [
            (Quantity::Extinction, tau),
            (Quantity::SingleScatteringAlbedo, ssa),
            (Quantity::Asymmetry, g),
        ] {
            compute_from_table(
                mask,
                size,
                table.grid(),
                table.coefficients(quantity),
                extrapolation,
                out,
            )?;
        }
        Ok(props)
    }
}

/// Scale the optical depth of every band by the condensate path where the
/// phase is present. Masked-out cells keep their zero optical depth whatever
/// the path holds there.
pub(crate) fn scale_by_path<T: NdFloat>(
    mut tau: ArrayViewMut3<'_, T>,
    mask: ArrayView2<'_, bool>,
    path: ArrayView2<'_, T>,
) {
    Zip::from(tau.lanes_mut(Axis(2)))
        .and(mask)
        .and(path)
        .par_for_each(|mut tau, &mask, &path| {
            if mask {
                tau.map_inplace(|tau| *tau *= path);
            }
        });
}

/// Compute the optical properties of one phase.
///
/// The table is interpolated at the effective radii where the phase is
/// present, and the resulting optical depth is scaled by the condensate
/// path.
pub fn build_phase<T, P>(
    table: &ParticleSizeTable<T>,
    fields: &PhaseFields<'_, T>,
    extrapolation: SizeExtrapolation,
) -> Result<P, CloudOpticsError>
where
    T: NdFloat,
    P: FromSizeTable<T>,
{
    if fields.path.dim() != fields.size.dim() {
        return Err(CloudOpticsError::InconsistentInputs { field: "path" });
    }
    if fields.mask.dim() != fields.size.dim() {
        return Err(CloudOpticsError::InconsistentInputs { field: "mask" });
    }

    let mut props = P::interpolate(table, fields.mask, fields.size, extrapolation)?;
    scale_by_path(props.tau_mut(), fields.mask, fields.path);
    Ok(props)
}
