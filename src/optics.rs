//! Cloud optical properties from particle size lookup tables

mod bands;
mod interpolate;
mod phase;
mod props;
mod table;


pub use self::bands::SpectralBands;
pub use self::interpolate::{compute_from_table, SizeExtrapolation, SizeGrid};
pub use self::phase::{build_phase, FromSizeTable, Phase, PhaseFields};
pub use self::props::{AbsorptionProps, OpticalProps, TwoStreamProps};
pub use self::table::{ParticleSizeTable, Quantity, SizeBounds};

use crate::error::CloudOpticsError;
use log::{debug, info};
use ndarray::{ArrayView2, ArrayView3, NdFloat};

/// Zero-based index of the ice roughness category used for all ice optics.
/// This is the intermediately rough category, the second of the three.
const ICE_ROUGHNESS: usize = 1;

/// Cloud optics from lookup tables for liquid droplets and ice crystals.
///
/// The tables are built once and never change, so a single instance can be
/// shared between threads.
#[derive(Debug, Clone)]
pub struct CloudOptics<T = f64> {
    bands: SpectralBands<T>,
    liquid: ParticleSizeTable<T>,
    ice: ParticleSizeTable<T>,
    radliq_fac: T,
    radice_fac: T,
    extrapolation: SizeExtrapolation,
}

impl<T: NdFloat> CloudOptics<T> {
    /// Load the lookup tables.
    ///
    /// `band_lims_wvn` is dimensioned as (`nbnd`, 2). The liquid tables are
    /// dimensioned as (`nsize_liq`, `nbnd`), and the ice tables as
    /// (`nsize_ice`, `nbnd`, `nrough`). The size axes span
    /// `radliq_lwr..=radliq_upr` and `radice_lwr..=radice_upr`, in µm, with
    /// evenly spaced points.
    ///
    /// Only the intermediately rough ice category is kept.
    ///
    /// The `_fac` factors are stored as-is and don't affect the
    /// interpolation.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        band_lims_wvn: ArrayView2<'_, T>,
        radliq_lwr: T,
        radliq_upr: T,
        radliq_fac: T,
        radice_lwr: T,
        radice_upr: T,
        radice_fac: T,
        lut_extliq: ArrayView2<'_, T>,
        lut_ssaliq: ArrayView2<'_, T>,
        lut_asyliq: ArrayView2<'_, T>,
        lut_extice: ArrayView3<'_, T>,
        lut_ssaice: ArrayView3<'_, T>,
        lut_asyice: ArrayView3<'_, T>,
    ) -> Result<Self, CloudOpticsError> {
        let bands = SpectralBands::new(band_lims_wvn)?;
        let nbnd = bands.nband();

        let liquid = ParticleSizeTable::new(
            Phase::Liquid,
            SizeBounds {
                lower: radliq_lwr,
                upper: radliq_upr,
                factor: radliq_fac,
            },
            nbnd,
            lut_extliq.to_owned(),
            lut_ssaliq.to_owned(),
            lut_asyliq.to_owned(),
        )?;

        let ice = ParticleSizeTable::with_roughness(
            Phase::Ice,
            SizeBounds {
                lower: radice_lwr,
                upper: radice_upr,
                factor: radice_fac,
            },
            nbnd,
            lut_extice,
            lut_ssaice,
            lut_asyice,
            ICE_ROUGHNESS,
        )?;

        info!(
            "Loaded cloud optics tables for {nbnd} bands ({} liquid sizes, {} ice sizes)",
            liquid.grid().nsteps(),
            ice.grid().nsteps()
        );

        Ok(Self {
            bands,
            liquid,
            ice,
            radliq_fac,
            radice_fac,
            extrapolation: SizeExtrapolation::default(),
        })
    }

    /// Change how effective radii outside of the table bounds are handled.
    pub fn with_size_extrapolation(mut self, extrapolation: SizeExtrapolation) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    /// How effective radii outside of the table bounds are handled.
    pub fn size_extrapolation(&self) -> SizeExtrapolation {
        self.extrapolation
    }

    /// Number of bands.
    pub fn nband(&self) -> usize {
        self.bands.nband()
    }

    /// Spectral bands.
    pub fn bands(&self) -> &SpectralBands<T> {
        &self.bands
    }

    /// Liquid droplet lookup table.
    pub fn liquid_table(&self) -> &ParticleSizeTable<T> {
        &self.liquid
    }

    /// Ice crystal lookup table, for the intermediately rough category.
    pub fn ice_table(&self) -> &ParticleSizeTable<T> {
        &self.ice
    }

    /// Liquid size factor passed at construction.
    pub fn radliq_fac(&self) -> T {
        self.radliq_fac
    }

    /// Ice size factor passed at construction.
    pub fn radice_fac(&self) -> T {
        self.radice_fac
    }

    /// Compute two-stream cloud optical properties into `optical_props`.
    ///
    /// The masks, condensate paths (`clwp`, `ciwp`, in g/m²), and effective
    /// radii (`reliq`, `reice`, in µm) are all dimensioned as (`ncol`,
    /// `nlay`). `optical_props` must be dimensioned as (`ncol`, `nlay`,
    /// `nbnd`).
    #[allow(clippy::too_many_arguments)]
    pub fn compute_two_stream(
        &self,
        liqmsk: ArrayView2<'_, bool>,
        icemsk: ArrayView2<'_, bool>,
        clwp: ArrayView2<'_, T>,
        ciwp: ArrayView2<'_, T>,
        reliq: ArrayView2<'_, T>,
        reice: ArrayView2<'_, T>,
        optical_props: &mut TwoStreamProps<T>,
    ) -> Result<(), CloudOpticsError> {
        self.compute(
            PhaseFields {
                mask: liqmsk.view(),
                path: clwp.view(),
                size: reliq.view(),
            },
            PhaseFields {
                mask: icemsk.view(),
                path: ciwp.view(),
                size: reice.view(),
            },
            optical_props,
        )
    }

    /// Compute absorption-only cloud optical properties into
    /// `optical_props`.
    ///
    /// The inputs are the same as for [`CloudOptics::compute_two_stream`].
    /// Only the optical depth is computed, so the result can't be mixed with
    /// two-stream properties.
    #[allow(clippy::too_many_arguments)]
    pub fn compute_absorption_only(
        &self,
        liqmsk: ArrayView2<'_, bool>,
        icemsk: ArrayView2<'_, bool>,
        clwp: ArrayView2<'_, T>,
        ciwp: ArrayView2<'_, T>,
        reliq: ArrayView2<'_, T>,
        reice: ArrayView2<'_, T>,
        optical_props: &mut AbsorptionProps<T>,
    ) -> Result<(), CloudOpticsError> {
        self.compute(
            PhaseFields {
                mask: liqmsk.view(),
                path: clwp.view(),
                size: reliq.view(),
            },
            PhaseFields {
                mask: icemsk.view(),
                path: ciwp.view(),
                size: reice.view(),
            },
            optical_props,
        )
    }

    /// Build both phases, combine them, and copy the result out.
    fn compute<P: FromSizeTable<T>>(
        &self,
        liquid: PhaseFields<'_, T>,
        ice: PhaseFields<'_, T>,
        optical_props: &mut P,
    ) -> Result<(), CloudOpticsError> {
        let (ncol, nlay) = liquid.path.dim();
        let nbnd = self.nband();
        self.check_shapes(&liquid, &ice, optical_props.shape())?;
        debug!(
            "computing {} cloud optics for {ncol} columns, {nlay} layers, {nbnd} bands",
            P::NAME
        );

        // The phases don't depend on each other
        let (liquid, ice) = rayon::join(
            || build_phase::<T, P>(&self.liquid, &liquid, self.extrapolation),
            || build_phase::<T, P>(&self.ice, &ice, self.extrapolation),
        );
        let clouds = liquid?.combine(&ice?)?;

        optical_props.assign(&clouds)
    }

    /// Check that every field is dimensioned as (`ncol`, `nlay`) and the
    /// output as (`ncol`, `nlay`, `nbnd`), where `ncol` and `nlay` are taken
    /// from the liquid water path.
    fn check_shapes(
        &self,
        liquid: &PhaseFields<'_, T>,
        ice: &PhaseFields<'_, T>,
        output: (usize, usize, usize),
    ) -> Result<(), CloudOpticsError> {
        let dims = liquid.path.dim();
        let fields = [
            ("liqmsk", liquid.mask.dim()),
            ("icemsk", ice.mask.dim()),
            ("ciwp", ice.path.dim()),
            ("reliq", liquid.size.dim()),
            ("reice", ice.size.dim()),
        ];
        if let Some(&(field, _)) = fields.iter().find(|(_, d)| *d != dims) {
            return Err(CloudOpticsError::InconsistentInputs { field });
        }
        if output != (dims.0, dims.1, self.nband()) {
            return Err(CloudOpticsError::InconsistentInputs {
                field: "optical_props",
            });
        }
        Ok(())
    }
}
