//! End-to-end cloud optics over multi-column atmospheres.

use approx::assert_relative_eq;
use cloud_optics::{
    AbsorptionProps, CloudOptics, CloudOpticsError, OpticalProps, SizeExtrapolation,
    TwoStreamProps,
};
use ndarray::{Array2, Array3};

const NBND: usize = 3;
const NSIZE_LIQ: usize = 28;
const NSIZE_ICE: usize = 46;

/// Lookup tables shaped like the shortwave ones, with smooth made-up values:
/// extinction falls with size, albedo and asymmetry stay in range.
fn engine() -> CloudOptics<f64> {
    let band_lims = Array2::from_shape_fn((NBND, 2), |(band, side)| 1000. * (band + side) as f64);

    let liq = |offset: f64, slope: f64| {
        Array2::from_shape_fn((NSIZE_LIQ, NBND), |(size, band)| {
            offset + slope * (size as f64 + 1.).recip() + 0.01 * band as f64
        })
    };
    let ice = |offset: f64, slope: f64| {
        Array3::from_shape_fn((NSIZE_ICE, NBND, 3), |(size, band, rough)| {
            offset + slope * (size as f64 + 1.).recip() + 0.01 * band as f64 + 0.02 * rough as f64
        })
    };

    CloudOptics::new(
        band_lims.view(),
        2.5,
        21.5,
        25.,
        10.,
        180.,
        3.,
        liq(0.05, 1.5).view(),
        liq(0.85, 0.1).view(),
        liq(0.75, 0.1).view(),
        ice(0.02, 0.8).view(),
        ice(0.80, 0.1).view(),
        ice(0.70, 0.1).view(),
    )
    .unwrap()
}

/// Columns of increasing cloudiness: clear, liquid only, ice only, mixed.
struct Atmosphere {
    liqmsk: Array2<bool>,
    icemsk: Array2<bool>,
    clwp: Array2<f64>,
    ciwp: Array2<f64>,
    reliq: Array2<f64>,
    reice: Array2<f64>,
}

impl Atmosphere {
    fn new(nlay: usize) -> Self {
        let ncol = 4;
        let clwp = Array2::from_shape_fn((ncol, nlay), |(col, lay)| match col {
            1 | 3 => 10. + lay as f64,
            _ => 0.,
        });
        let ciwp = Array2::from_shape_fn((ncol, nlay), |(col, lay)| match col {
            2 | 3 => 2. + 0.5 * lay as f64,
            _ => 0.,
        });
        Self {
            liqmsk: clwp.mapv(|v| v > 0.),
            icemsk: ciwp.mapv(|v| v > 0.),
            reliq: Array2::from_shape_fn((ncol, nlay), |(_, lay)| 4. + 1.5 * lay as f64),
            reice: Array2::from_shape_fn((ncol, nlay), |(_, lay)| 20. + 12. * lay as f64),
            clwp,
            ciwp,
        }
    }

    fn dim(&self) -> (usize, usize) {
        self.clwp.dim()
    }

    fn two_stream(&self, engine: &CloudOptics<f64>, out: &mut TwoStreamProps<f64>) {
        engine
            .compute_two_stream(
                self.liqmsk.view(),
                self.icemsk.view(),
                self.clwp.view(),
                self.ciwp.view(),
                self.reliq.view(),
                self.reice.view(),
                out,
            )
            .unwrap();
    }

    fn absorption_only(&self, engine: &CloudOptics<f64>, out: &mut AbsorptionProps<f64>) {
        engine
            .compute_absorption_only(
                self.liqmsk.view(),
                self.icemsk.view(),
                self.clwp.view(),
                self.ciwp.view(),
                self.reliq.view(),
                self.reice.view(),
                out,
            )
            .unwrap();
    }
}

#[test]
fn representations_agree_on_optical_depth() {
    let engine = engine();
    let atmosphere = Atmosphere::new(8);
    let (ncol, nlay) = atmosphere.dim();

    let mut two_stream = TwoStreamProps::zeros(ncol, nlay, NBND);
    atmosphere.two_stream(&engine, &mut two_stream);
    let mut absorption = AbsorptionProps::zeros(ncol, nlay, NBND);
    atmosphere.absorption_only(&engine, &mut absorption);

    assert!(two_stream.validate().is_ok());
    assert!(absorption.validate().is_ok());
    for (&a, &b) in two_stream.tau().iter().zip(absorption.tau().iter()) {
        assert_relative_eq!(a, b, max_relative = 1e-12);
    }

    // Clear column
    assert!(two_stream
        .tau()
        .index_axis(ndarray::Axis(0), 0)
        .iter()
        .all(|&tau| tau == 0.));

    // Cloudy columns, and the mixed column is the thickest
    for col in 1..ncol {
        for lay in 0..nlay {
            for band in 0..NBND {
                assert!(two_stream.tau()[[col, lay, band]] > 0.);
                assert!(two_stream.tau()[[3, lay, band]] >= two_stream.tau()[[col, lay, band]]);
            }
        }
    }
}

#[test]
fn output_is_overwritten() {
    let engine = engine();
    let atmosphere = Atmosphere::new(5);
    let (ncol, nlay) = atmosphere.dim();

    let mut fresh = TwoStreamProps::zeros(ncol, nlay, NBND);
    atmosphere.two_stream(&engine, &mut fresh);

    let mut reused = TwoStreamProps::zeros(ncol, nlay, NBND);
    reused.tau_mut().fill(f64::NAN);
    reused.ssa_mut().fill(-1.);
    reused.g_mut().fill(7.);
    atmosphere.two_stream(&engine, &mut reused);

    assert_eq!(reused, fresh);
}

#[test]
fn shared_between_threads() {
    let engine = engine();
    let atmosphere = Atmosphere::new(6);
    let (ncol, nlay) = atmosphere.dim();

    let mut expected = AbsorptionProps::zeros(ncol, nlay, NBND);
    atmosphere.absorption_only(&engine, &mut expected);

    let (engine, atmosphere) = (&engine, &atmosphere);
    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(move || {
                    let mut out = AbsorptionProps::zeros(ncol, nlay, NBND);
                    atmosphere.absorption_only(engine, &mut out);
                    out
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for result in results {
        assert_eq!(result, expected);
    }
}

#[test]
fn clamped_sizes_stay_within_table() {
    let engine = engine().with_size_extrapolation(SizeExtrapolation::Clamp);
    let mut atmosphere = Atmosphere::new(3);
    atmosphere.reliq.fill(1e4);
    atmosphere.reice.fill(-1e4);
    let (ncol, nlay) = atmosphere.dim();

    let mut props = TwoStreamProps::zeros(ncol, nlay, NBND);
    atmosphere.two_stream(&engine, &mut props);
    assert!(props.validate().is_ok());

    let ext_liq = engine
        .liquid_table()
        .coefficients(cloud_optics::optics::Quantity::Extinction);
    for lay in 0..nlay {
        for band in 0..NBND {
            assert_relative_eq!(
                props.tau()[[1, lay, band]],
                ext_liq[[NSIZE_LIQ - 1, band]] * atmosphere.clwp[[1, lay]],
                max_relative = 1e-12
            );
        }
    }
}

#[test]
fn delta_scaled_two_stream() {
    let engine = engine();
    let atmosphere = Atmosphere::new(4);
    let (ncol, nlay) = atmosphere.dim();

    let mut props = TwoStreamProps::zeros(ncol, nlay, NBND);
    atmosphere.two_stream(&engine, &mut props);
    let unscaled = props.clone();
    props.delta_scale();

    assert!(props.validate().is_ok());
    for (&scaled, &tau) in props.tau().iter().zip(unscaled.tau().iter()) {
        assert!(scaled <= tau);
    }
}

#[test]
fn mismatched_output() {
    let engine = engine();
    let atmosphere = Atmosphere::new(4);
    let (ncol, nlay) = atmosphere.dim();

    let mut props = AbsorptionProps::zeros(ncol, nlay + 1, NBND);
    let err = engine
        .compute_absorption_only(
            atmosphere.liqmsk.view(),
            atmosphere.icemsk.view(),
            atmosphere.clwp.view(),
            atmosphere.ciwp.view(),
            atmosphere.reliq.view(),
            atmosphere.reice.view(),
            &mut props,
        )
        .unwrap_err();

    assert_eq!(
        err,
        CloudOpticsError::InconsistentInputs {
            field: "optical_props"
        }
    );
    assert_eq!(err.to_string(), "input `optical_props` has the wrong shape");
}
