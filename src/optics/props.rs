//! Optical property containers and their additive combination.
//!
//! All arrays are dimensioned as (`ncol`, `nlay`, `nbnd`).

use ndarray::{Array3, ArrayView3, ArrayViewMut3, NdFloat, Zip};

use crate::error::CloudOpticsError;

/// Three times the smallest positive normal value, guarding divisions by
/// optical depths that may be zero.
fn tiny<T: NdFloat>() -> T {
    let min = T::min_positive_value();
    min + min + min
}

/// Shared interface of the optical property representations.
pub trait OpticalProps<T: NdFloat>: Sized {
    /// Short name of the representation, used for logging.
    const NAME: &'static str;

    /// A container of all zeros.
    fn zeros(ncol: usize, nlay: usize, nbnd: usize) -> Self;

    /// Optical depth.
    fn tau(&self) -> ArrayView3<'_, T>;

    /// Mutable optical depth.
    fn tau_mut(&mut self) -> ArrayViewMut3<'_, T>;

    /// Dimensions as (`ncol`, `nlay`, `nbnd`).
    fn shape(&self) -> (usize, usize, usize) {
        self.tau().dim()
    }

    /// Add the optical properties of `other` to these, returning the
    /// combination.
    ///
    /// The optical depths add. Any other properties are weighted so that the
    /// total scattering is preserved.
    fn combine(self, other: &Self) -> Result<Self, CloudOpticsError>;

    /// Overwrite these optical properties with a copy of `other`.
    fn assign(&mut self, other: &Self) -> Result<(), CloudOpticsError>;

    /// Check that every property is within its physical range.
    fn validate(&self) -> Result<(), CloudOpticsError>;
}

/// Check that the optical depth is non-negative everywhere.
fn validate_tau<T: NdFloat>(tau: ArrayView3<'_, T>) -> Result<(), CloudOpticsError> {
    if tau.iter().all(|&tau| tau >= T::zero()) {
        Ok(())
    } else {
        Err(CloudOpticsError::OutOfRange { field: "tau" })
    }
}

/// Absorption-only optical properties: optical depth alone.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsorptionProps<T> {
    tau: Array3<T>,
}

impl<T: NdFloat> OpticalProps<T> for AbsorptionProps<T> {
    const NAME: &'static str = "absorption-only";

    fn zeros(ncol: usize, nlay: usize, nbnd: usize) -> Self {
        Self {
            tau: Array3::zeros((ncol, nlay, nbnd)),
        }
    }

    fn tau(&self) -> ArrayView3<'_, T> {
        self.tau.view()
    }

    fn tau_mut(&mut self) -> ArrayViewMut3<'_, T> {
        self.tau.view_mut()
    }

    fn combine(mut self, other: &Self) -> Result<Self, CloudOpticsError> {
        if other.shape() != self.shape() {
            return Err(CloudOpticsError::InconsistentInputs { field: "tau" });
        }
        Zip::from(&mut self.tau)
            .and(&other.tau)
            .par_for_each(|tau1, &tau2| *tau1 += tau2);
        Ok(self)
    }

    fn assign(&mut self, other: &Self) -> Result<(), CloudOpticsError> {
        if other.shape() != self.shape() {
            return Err(CloudOpticsError::InconsistentInputs { field: "output" });
        }
        self.tau.assign(&other.tau);
        Ok(())
    }

    fn validate(&self) -> Result<(), CloudOpticsError> {
        validate_tau(self.tau.view())
    }
}

/// Two-stream optical properties: optical depth, single-scattering albedo,
/// and asymmetry parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoStreamProps<T> {
    tau: Array3<T>,
    ssa: Array3<T>,
    g: Array3<T>,
}

impl<T: NdFloat> TwoStreamProps<T> {
    /// Single-scattering albedo.
    pub fn ssa(&self) -> ArrayView3<'_, T> {
        self.ssa.view()
    }

    /// Mutable single-scattering albedo.
    pub fn ssa_mut(&mut self) -> ArrayViewMut3<'_, T> {
        self.ssa.view_mut()
    }

    /// Asymmetry parameter.
    pub fn g(&self) -> ArrayView3<'_, T> {
        self.g.view()
    }

    /// Mutable asymmetry parameter.
    pub fn g_mut(&mut self) -> ArrayViewMut3<'_, T> {
        self.g.view_mut()
    }

    /// Mutable views of (`tau`, `ssa`, `g`) at once.
    pub fn split_mut(
        &mut self,
    ) -> (
        ArrayViewMut3<'_, T>,
        ArrayViewMut3<'_, T>,
        ArrayViewMut3<'_, T>,
    ) {
        (self.tau.view_mut(), self.ssa.view_mut(), self.g.view_mut())
    }

    /// Delta-scale the properties, treating the fraction `g²` of the
    /// scattering as unscattered forward peak.
    pub fn delta_scale(&mut self) {
        let eps = tiny::<T>();
        Zip::from(&mut self.tau)
            .and(&mut self.ssa)
            .and(&mut self.g)
            .par_for_each(|tau, ssa, g| {
                let f = *g * *g;
                let wf = *ssa * f;
                *tau *= T::one() - wf;
                *ssa = *ssa * (T::one() - f) / (T::one() - wf).max(eps);
                *g = (*g - f) / (T::one() - f).max(eps);
            });
    }
}

impl<T: NdFloat> OpticalProps<T> for TwoStreamProps<T> {
    const NAME: &'static str = "two-stream";

    fn zeros(ncol: usize, nlay: usize, nbnd: usize) -> Self {
        Self {
            tau: Array3::zeros((ncol, nlay, nbnd)),
            ssa: Array3::zeros((ncol, nlay, nbnd)),
            g: Array3::zeros((ncol, nlay, nbnd)),
        }
    }

    fn tau(&self) -> ArrayView3<'_, T> {
        self.tau.view()
    }

    fn tau_mut(&mut self) -> ArrayViewMut3<'_, T> {
        self.tau.view_mut()
    }

    fn combine(mut self, other: &Self) -> Result<Self, CloudOpticsError> {
        if other.shape() != self.shape() {
            return Err(CloudOpticsError::InconsistentInputs { field: "tau" });
        }

        let eps = tiny::<T>();
        Zip::from(&mut self.tau)
            .and(&mut self.ssa)
            .and(&mut self.g)
            .and(&other.tau)
            .and(&other.ssa)
            .and(&other.g)
            .par_for_each(|tau1, ssa1, g1, &tau2, &ssa2, &g2| {
                let tau12 = *tau1 + tau2;
                let tauscat12 = *tau1 * *ssa1 + tau2 * ssa2;

                *g1 = (*tau1 * *ssa1 * *g1 + tau2 * ssa2 * g2) / tauscat12.max(eps);
                *ssa1 = tauscat12 / tau12.max(eps);
                *tau1 = tau12;
            });

        Ok(self)
    }

    fn assign(&mut self, other: &Self) -> Result<(), CloudOpticsError> {
        if other.shape() != self.shape() {
            return Err(CloudOpticsError::InconsistentInputs { field: "output" });
        }
        self.tau.assign(&other.tau);
        self.ssa.assign(&other.ssa);
        self.g.assign(&other.g);
        Ok(())
    }

    fn validate(&self) -> Result<(), CloudOpticsError> {
        validate_tau(self.tau.view())?;
        if !self
            .ssa
            .iter()
            .all(|&ssa| ssa >= T::zero() && ssa <= T::one())
        {
            return Err(CloudOpticsError::OutOfRange { field: "ssa" });
        }
        if !self.g.iter().all(|&g| g >= -T::one() && g <= T::one()) {
            return Err(CloudOpticsError::OutOfRange { field: "g" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_stream(tau: f64, ssa: f64, g: f64) -> TwoStreamProps<f64> {
        let mut props = TwoStreamProps::zeros(2, 3, 4);
        let (mut t, mut w, mut a) = props.split_mut();
        t.fill(tau);
        w.fill(ssa);
        a.fill(g);
        props
    }

    #[test]
    fn combine_two_stream() {
        let liquid = two_stream(2.0, 0.9, 0.8);
        let ice = two_stream(1.0, 0.6, 0.7);
        let combined = liquid.combine(&ice).unwrap();

        let tauscat = 2.0 * 0.9 + 1.0 * 0.6;
        for ((&tau, &ssa), &g) in combined
            .tau()
            .iter()
            .zip(combined.ssa().iter())
            .zip(combined.g().iter())
        {
            assert_relative_eq!(tau, 3.0);
            assert_relative_eq!(ssa, tauscat / 3.0);
            assert_relative_eq!(g, (2.0 * 0.9 * 0.8 + 1.0 * 0.6 * 0.7) / tauscat);
        }

        // The second operand is left alone
        assert_eq!(ice, two_stream(1.0, 0.6, 0.7));
    }

    #[test]
    fn combine_empty_cells() {
        let combined = two_stream(0., 0., 0.)
            .combine(&two_stream(0., 0., 0.))
            .unwrap();
        assert!(combined.tau().iter().all(|&v| v == 0.));
        assert!(combined.ssa().iter().all(|&v| v == 0.));
        assert!(combined.g().iter().all(|&v| v == 0.));

        // Purely absorbing phases have no asymmetry to mix
        let combined = two_stream(1.5, 0., 0.3)
            .combine(&two_stream(0.5, 0., 0.9))
            .unwrap();
        assert!(combined.tau().iter().all(|&v| v == 2.0));
        assert!(combined.ssa().iter().all(|&v| v == 0.));
        assert!(combined.g().iter().all(|&v| v == 0.));
    }

    #[test]
    fn combine_absorption() {
        let mut liquid = AbsorptionProps::<f32>::zeros(1, 2, 3);
        liquid.tau_mut().fill(0.25);
        let mut ice = AbsorptionProps::zeros(1, 2, 3);
        ice.tau_mut().fill(1.5);

        let combined = liquid.combine(&ice).unwrap();
        assert!(combined.tau().iter().all(|&v| v == 1.75));
    }

    #[test]
    fn combine_shape_mismatch() {
        let err = AbsorptionProps::<f64>::zeros(1, 2, 3)
            .combine(&AbsorptionProps::zeros(1, 2, 4))
            .unwrap_err();
        assert_eq!(err, CloudOpticsError::InconsistentInputs { field: "tau" });

        let mut out = TwoStreamProps::<f64>::zeros(2, 2, 4);
        assert_eq!(
            out.assign(&two_stream(1., 0.5, 0.5)),
            Err(CloudOpticsError::InconsistentInputs { field: "output" })
        );
    }

    #[test]
    fn assign_copies() {
        let mut out = TwoStreamProps::zeros(2, 3, 4);
        let source = two_stream(1., 0.5, 0.25);
        out.assign(&source).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn validation() {
        assert!(two_stream(1., 0.5, 0.25).validate().is_ok());
        assert!(AbsorptionProps::<f64>::zeros(1, 1, 1).validate().is_ok());

        assert_eq!(
            two_stream(-1., 0.5, 0.25).validate(),
            Err(CloudOpticsError::OutOfRange { field: "tau" })
        );
        assert_eq!(
            two_stream(1., 1.5, 0.25).validate(),
            Err(CloudOpticsError::OutOfRange { field: "ssa" })
        );
        assert_eq!(
            two_stream(1., 0.5, -1.25).validate(),
            Err(CloudOpticsError::OutOfRange { field: "g" })
        );
        assert_eq!(
            two_stream(1., f64::NAN, 0.25).validate(),
            Err(CloudOpticsError::OutOfRange { field: "ssa" })
        );
    }

    #[test]
    fn delta_scaling() {
        let mut props = two_stream(2.0, 0.5, 0.5);
        props.delta_scale();

        // f = 0.25, ssa * f = 0.125
        assert_relative_eq!(props.tau()[[0, 0, 0]], 2.0 * 0.875);
        assert_relative_eq!(props.ssa()[[1, 2, 3]], 0.5 * 0.75 / 0.875);
        assert_relative_eq!(props.g()[[1, 0, 2]], 0.25 / 0.75);

        // A fully forward-scattering medium stays finite
        let mut forward = two_stream(1.0, 1.0, 1.0);
        forward.delta_scale();
        assert!(forward.tau().iter().all(|&v| v == 0.));
        assert!(forward.g().iter().all(|&v| v == 0.));
    }
}
