//! Interface between Rust and Python.

use log::{debug, info};
use numpy::{PyArray2, PyArray3, PyReadonlyArray2, PyReadonlyArray3, ToPyArray};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::error::CloudOpticsError;
use crate::optics::{AbsorptionProps, CloudOptics, OpticalProps, TwoStreamProps};

impl From<CloudOpticsError> for PyErr {
    fn from(e: CloudOpticsError) -> Self {
        PyValueError::new_err(e.to_string())
    }
}

/// Build a thread pool with `num_threads` workers, or with an automatically
/// chosen number of workers for `None`.
fn thread_pool(num_threads: Option<usize>) -> PyResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads.unwrap_or(0))
        .build()
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Two-stream cloud optical properties.
///
/// Each property is a numpy array dimensioned as (`ncol`, `nlay`, `nbnd`).
#[pyclass]
#[derive(Debug)]
struct TwoStreamOutput {
    props: TwoStreamProps<f64>,
}

#[pymethods]
impl TwoStreamOutput {
    #[getter]
    fn tau<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray3<f64>> {
        self.props.tau().to_pyarray(py)
    }

    #[getter]
    fn ssa<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray3<f64>> {
        self.props.ssa().to_pyarray(py)
    }

    #[getter]
    fn g<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray3<f64>> {
        self.props.g().to_pyarray(py)
    }
}

/// Absorption-only cloud optical properties.
///
/// The optical depth is a numpy array dimensioned as (`ncol`, `nlay`,
/// `nbnd`).
#[pyclass]
#[derive(Debug)]
struct AbsorptionOutput {
    props: AbsorptionProps<f64>,
}

#[pymethods]
impl AbsorptionOutput {
    #[getter]
    fn tau<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray3<f64>> {
        self.props.tau().to_pyarray(py)
    }
}

/// Cloud optics lookup tables.
///
/// `band_lims_wvn` has shape (`nbnd`, 2). The liquid tables have shape
/// (`nsize_liq`, `nbnd`) and the ice tables (`nsize_ice`, `nbnd`, `nrough`).
/// Only the intermediately rough ice category is used.
#[pyclass(name = "CloudOptics")]
#[derive(Debug)]
struct PyCloudOptics {
    inner: CloudOptics<f64>,
}

#[pymethods]
impl PyCloudOptics {
    #[new]
    #[pyo3(signature = (band_lims_wvn, radliq_lwr, radliq_upr, radliq_fac, radice_lwr, radice_upr, radice_fac, lut_extliq, lut_ssaliq, lut_asyliq, lut_extice, lut_ssaice, lut_asyice))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        band_lims_wvn: PyReadonlyArray2<'_, f64>,
        radliq_lwr: f64,
        radliq_upr: f64,
        radliq_fac: f64,
        radice_lwr: f64,
        radice_upr: f64,
        radice_fac: f64,
        lut_extliq: PyReadonlyArray2<'_, f64>,
        lut_ssaliq: PyReadonlyArray2<'_, f64>,
        lut_asyliq: PyReadonlyArray2<'_, f64>,
        lut_extice: PyReadonlyArray3<'_, f64>,
        lut_ssaice: PyReadonlyArray3<'_, f64>,
        lut_asyice: PyReadonlyArray3<'_, f64>,
    ) -> PyResult<Self> {
        let inner = CloudOptics::new(
            band_lims_wvn.as_array(),
            radliq_lwr,
            radliq_upr,
            radliq_fac,
            radice_lwr,
            radice_upr,
            radice_fac,
            lut_extliq.as_array(),
            lut_ssaliq.as_array(),
            lut_asyliq.as_array(),
            lut_extice.as_array(),
            lut_ssaice.as_array(),
            lut_asyice.as_array(),
        )?;
        Ok(Self { inner })
    }

    /// Number of bands.
    #[getter]
    fn nband(&self) -> usize {
        self.inner.nband()
    }

    /// Band limits in cm⁻¹, with shape (`nbnd`, 2).
    #[getter]
    fn band_lims_wvn<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        self.inner.bands().band_lims_wvn().to_pyarray(py)
    }

    /// Compute two-stream cloud optical properties.
    ///
    /// The masks (boolean), condensate paths in g/m² (`clwp`, `ciwp`), and
    /// effective radii in µm (`reliq`, `reice`) all have shape (`ncol`,
    /// `nlay`).
    ///
    /// The number of worker threads is controlled by `num_threads`. It must be
    /// a positive integer, or `None` to automatically choose the number of
    /// threads.
    #[pyo3(signature = (liqmsk, icemsk, clwp, ciwp, reliq, reice, num_threads=None))]
    #[allow(clippy::too_many_arguments)]
    fn compute_two_stream(
        &self,
        py: Python<'_>,
        liqmsk: PyReadonlyArray2<'_, bool>,
        icemsk: PyReadonlyArray2<'_, bool>,
        clwp: PyReadonlyArray2<'_, f64>,
        ciwp: PyReadonlyArray2<'_, f64>,
        reliq: PyReadonlyArray2<'_, f64>,
        reice: PyReadonlyArray2<'_, f64>,
        num_threads: Option<usize>,
    ) -> PyResult<TwoStreamOutput> {
        let (ncol, nlay) = clwp.as_array().dim();
        let mut props = TwoStreamProps::zeros(ncol, nlay, self.inner.nband());
        let pool = thread_pool(num_threads)?;

        info!("Computing two-stream cloud optics for {ncol} columns and {nlay} layers");
        let (liqmsk, icemsk) = (liqmsk.as_array(), icemsk.as_array());
        let (clwp, ciwp) = (clwp.as_array(), ciwp.as_array());
        let (reliq, reice) = (reliq.as_array(), reice.as_array());
        py.allow_threads(|| {
            pool.install(|| {
                self.inner
                    .compute_two_stream(liqmsk, icemsk, clwp, ciwp, reliq, reice, &mut props)
            })
        })?;
        debug!("finished two-stream cloud optics");

        Ok(TwoStreamOutput { props })
    }

    /// Compute absorption-only cloud optical properties.
    ///
    /// The inputs are the same as for `compute_two_stream`.
    #[pyo3(signature = (liqmsk, icemsk, clwp, ciwp, reliq, reice, num_threads=None))]
    #[allow(clippy::too_many_arguments)]
    fn compute_absorption_only(
        &self,
        py: Python<'_>,
        liqmsk: PyReadonlyArray2<'_, bool>,
        icemsk: PyReadonlyArray2<'_, bool>,
        clwp: PyReadonlyArray2<'_, f64>,
        ciwp: PyReadonlyArray2<'_, f64>,
        reliq: PyReadonlyArray2<'_, f64>,
        reice: PyReadonlyArray2<'_, f64>,
        num_threads: Option<usize>,
    ) -> PyResult<AbsorptionOutput> {
        let (ncol, nlay) = clwp.as_array().dim();
        let mut props = AbsorptionProps::zeros(ncol, nlay, self.inner.nband());
        let pool = thread_pool(num_threads)?;

        info!("Computing absorption-only cloud optics for {ncol} columns and {nlay} layers");
        let (liqmsk, icemsk) = (liqmsk.as_array(), icemsk.as_array());
        let (clwp, ciwp) = (clwp.as_array(), ciwp.as_array());
        let (reliq, reice) = (reliq.as_array(), reice.as_array());
        py.allow_threads(|| {
            pool.install(|| {
                self.inner
                    .compute_absorption_only(liqmsk, icemsk, clwp, ciwp, reliq, reice, &mut props)
            })
        })?;
        debug!("finished absorption-only cloud optics");

        Ok(AbsorptionOutput { props })
    }
}

/// A Python module implemented in Rust.
#[pymodule]
fn cloud_optics(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_class::<PyCloudOptics>()?;
    m.add_class::<TwoStreamOutput>()?;
    m.add_class::<AbsorptionOutput>()?;
    Ok(())
}
