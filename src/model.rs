//! Radiocarbon age sources.
//!
//! [`AgeSource`] is the seam behind which a steady-state tracer solver lives.
//! [`SyntheticAgeModel`] is a small stand-in: every ocean column is solved
//! independently for the steady-state 14C ratio under vertical mixing and
//! radioactive decay,
//!
//! ```text
//!   d/dz (K dR/dz) - λ R = 0,   R(surface) = exp(-λ · reservoir_age),   dR/dz(bottom) = 0
//! ```
//!
//! and the ratio is converted to an age with [`radiocarbon_age`].

use std::f64::consts::LN_2;
use std::fmt;

use crate::field::{AgeField, FieldError, Grid};

/// Half-life of 14C in years.
pub const C14_HALF_LIFE_YEARS: f64 = 5730.0;

/// Decay rate `λ = ln 2 / half-life` in 1/yr.
pub fn decay_rate(half_life_years: f64) -> f64 {
    LN_2 / half_life_years
}

/// Age in years of water with 14C ratio `ratio` relative to the atmosphere.
///
/// `NaN` for a non-positive or non-finite ratio.
pub fn radiocarbon_age(ratio: f64) -> f64 {
    radiocarbon_age_with(ratio, C14_HALF_LIFE_YEARS)
}

pub fn radiocarbon_age_with(ratio: f64, half_life_years: f64) -> f64 {
    if !(ratio > 0.0) || !ratio.is_finite() {
        return f64::NAN;
    }
    (1.0 / ratio).ln() / decay_rate(half_life_years)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    InvalidParameter { name: &'static str, value: f64 },
    /// Residual of the solved system stayed above tolerance.
    NotConverged { residual: f64, tolerance: f64 },
    Field(FieldError),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::InvalidParameter { name, value } => {
                write!(f, "invalid parameter {name} = {value}")
            }
            SolveError::NotConverged {
                residual,
                tolerance,
            } => write!(
                f,
                "steady state not reached: residual {residual:e} above tolerance {tolerance:e}"
            ),
            SolveError::Field(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolveError::Field(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FieldError> for SolveError {
    fn from(e: FieldError) -> Self {
        SolveError::Field(e)
    }
}

/// Parameters of a steady-state age computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeParams {
    /// Age of surface water (air-sea equilibration lag), years.
    pub reservoir_age_years: f64,
    /// Reference vertical diffusivity, m²/yr.
    pub diffusivity: f64,
    pub half_life_years: f64,
    /// Largest acceptable relative residual of the solved system.
    pub tolerance: f64,
}

impl Default for AgeParams {
    fn default() -> Self {
        Self {
            reservoir_age_years: 400.0,
            diffusivity: 8000.0,
            half_life_years: C14_HALF_LIFE_YEARS,
            tolerance: 1e-9,
        }
    }
}

impl AgeParams {
    pub fn validate(&self) -> Result<(), SolveError> {
        let checks = [
            ("reservoir_age_years", self.reservoir_age_years, true),
            ("diffusivity", self.diffusivity, false),
            ("half_life_years", self.half_life_years, false),
            ("tolerance", self.tolerance, false),
        ];
        for (name, value, zero_ok) in checks {
            let ok = value.is_finite() && (value > 0.0 || (zero_ok && value == 0.0));
            if !ok {
                return Err(SolveError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

/// Something that can produce a radiocarbon age field.
pub trait AgeSource {
    fn name(&self) -> &str;
    fn solve(&self, params: &AgeParams) -> Result<AgeField, SolveError>;
}

/// Idealized global ocean with box continents and a wavy sea floor.
#[derive(Debug, Clone)]
pub struct SyntheticAgeModel {
    grid: Grid,
}

impl SyntheticAgeModel {
    pub fn new(grid: Grid) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Crude continents as lon/lat boxes.
    pub fn is_land(lon: f64, lat: f64) -> bool {
        let lon = lon.rem_euclid(360.0);
        const BOXES: [[f64; 4]; 6] = [
            // lon_min, lon_max, lat_min, lat_max
            [280.0, 325.0, -55.0, 10.0],  // South America
            [235.0, 300.0, 15.0, 70.0],   // North America
            [345.0, 360.0, -35.0, 35.0],  // West Africa
            [0.0, 50.0, -35.0, 70.0],     // Africa and Europe
            [50.0, 140.0, 20.0, 75.0],    // Asia
            [115.0, 150.0, -38.0, -15.0], // Australia
        ];
        lat < -70.0
            || BOXES
                .iter()
                .any(|b| lon >= b[0] && lon < b[1] && lat >= b[2] && lat < b[3])
    }

    /// Sea floor depth in metres.
    pub fn bathymetry(lon: f64, lat: f64) -> f64 {
        4500.0 + 1000.0 * (3.0 * lon.to_radians()).cos() * (2.0 * lat.to_radians()).cos()
    }

    /// Multiplier on the reference diffusivity: deep-water formation in the
    /// North Atlantic and Southern Ocean, sluggish North Pacific.
    pub fn ventilation_factor(lon: f64, lat: f64) -> f64 {
        let lon = lon.rem_euclid(360.0);
        let bump = |centre: f64, width: f64| (-((lat - centre) / width).powi(2)).exp();
        let atlantic = if lon >= 290.0 || lon < 20.0 { 1.0 } else { 0.0 };
        let pacific = if (150.0..250.0).contains(&lon) { 1.0 } else { 0.0 };
        let f = 1.0 + 2.5 * atlantic * bump(60.0, 15.0) + 1.2 * bump(-60.0, 10.0)
            - 0.5 * pacific * bump(40.0, 25.0);
        f.max(0.2)
    }
}

impl AgeSource for SyntheticAgeModel {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn solve(&self, params: &AgeParams) -> Result<AgeField, SolveError> {
        params.validate()?;
        let (nlon, nlat, ndepth) = self.grid.shape();
        let lambda = decay_rate(params.half_life_years);
        let surface_ratio = (-lambda * params.reservoir_age_years).exp();
        let mut values = vec![f64::NAN; self.grid.len()];
        let mut worst = 0.0f64;

        for j in 0..nlat {
            for i in 0..nlon {
                let (lon, lat) = (self.grid.lon[i], self.grid.lat[j]);
                if Self::is_land(lon, lat) {
                    continue;
                }
                let floor = Self::bathymetry(lon, lat);
                let levels = self.grid.depth.iter().take_while(|d| **d < floor).count();
                if levels == 0 {
                    continue;
                }
                let k_diff = params.diffusivity * Self::ventilation_factor(lon, lat);
                let depth = &self.grid.depth[..levels];
                let (ratio, residual) = solve_column(depth, k_diff, lambda, surface_ratio);
                worst = worst.max(residual);
                for (k, r) in ratio.into_iter().enumerate() {
                    values[self.grid.index(i, j, k)] =
                        radiocarbon_age_with(r, params.half_life_years);
                }
            }
        }

        check_residual(worst, params.tolerance)?;
        log::info!(
            "{} age field solved on {}x{}x{} grid (residual {:e})",
            self.name(),
            nlon,
            nlat,
            ndepth,
            worst
        );
        Ok(AgeField::new(self.grid.clone(), values)?)
    }
}

fn check_residual(residual: f64, tolerance: f64) -> Result<(), SolveError> {
    if residual <= tolerance {
        Ok(())
    } else {
        Err(SolveError::NotConverged {
            residual,
            tolerance,
        })
    }
}

/// Solve one column by the Thomas algorithm and return the ratios together
/// with the relative residual of the discrete system.
fn solve_column(depth: &[f64], k_diff: f64, lambda: f64, surface: f64) -> (Vec<f64>, f64) {
    let n = depth.len();
    let mut a = vec![0.0; n];
    let mut b = vec![0.0; n];
    let mut c = vec![0.0; n];
    let mut rhs = vec![0.0; n];

    b[0] = 1.0;
    rhs[0] = surface;
    for k in 1..n {
        if k + 1 < n {
            let h_up = depth[k] - depth[k - 1];
            let h_dn = depth[k + 1] - depth[k];
            let mid = (h_up + h_dn) / 2.0;
            a[k] = k_diff / (h_up * mid);
            c[k] = k_diff / (h_dn * mid);
            b[k] = -(a[k] + c[k]) - lambda;
        } else {
            // No-flux bottom via a mirrored ghost level.
            let h = depth[k] - depth[k - 1];
            a[k] = 2.0 * k_diff / (h * h);
            b[k] = -a[k] - lambda;
        }
    }

    let mut cp = vec![0.0; n];
    let mut dp = vec![0.0; n];
    cp[0] = c[0] / b[0];
    dp[0] = rhs[0] / b[0];
    for k in 1..n {
        let m = b[k] - a[k] * cp[k - 1];
        cp[k] = c[k] / m;
        dp[k] = (rhs[k] - a[k] * dp[k - 1]) / m;
    }
    let mut x = vec![0.0; n];
    x[n - 1] = dp[n - 1];
    for k in (0..n - 1).rev() {
        x[k] = dp[k] - cp[k] * x[k + 1];
    }

    let mut residual = 0.0f64;
    for k in 0..n {
        let mut r = b[k] * x[k] - rhs[k];
        if k > 0 {
            r += a[k] * x[k - 1];
        }
        if k + 1 < n {
            r += c[k] * x[k + 1];
        }
        let scale = b[k].abs() * surface;
        residual = residual.max((r / scale).abs());
    }
    if x.iter().any(|v| !v.is_finite()) {
        residual = f64::INFINITY;
    }
    (x, residual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::STANDARD_DEPTHS;
    use crate::geometry::PlotPos;

    #[test]
    fn ratio_one_is_age_zero() {
        assert_eq!(radiocarbon_age(1.0), 0.0);
    }

    #[test]
    fn half_ratio_is_one_half_life() {
        assert!((radiocarbon_age(0.5) - 5730.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_ratio_has_no_age() {
        assert!(radiocarbon_age(0.0).is_nan());
        assert!(radiocarbon_age(-1.0).is_nan());
        assert!(radiocarbon_age(f64::NAN).is_nan());
    }

    #[test]
    fn column_matches_analytic_solution() {
        // Uniform K: R(z) = R0 cosh((L - z) / l) / cosh(L / l), l = sqrt(K / λ).
        let depth: Vec<f64> = (0..=500).map(|k| k as f64 * 10.0).collect();
        let lambda = decay_rate(C14_HALF_LIFE_YEARS);
        let k_diff = 8000.0;
        let (r, residual) = solve_column(&depth, k_diff, lambda, 1.0);
        assert!(residual < 1e-9);
        let l = (k_diff / lambda).sqrt();
        let big_l = 5000.0;
        let expected = ((big_l - 5000.0) / l).cosh() / (big_l / l).cosh();
        assert!((r[500] - expected).abs() / expected < 1e-3, "{} vs {}", r[500], expected);
    }

    #[test]
    fn age_increases_with_depth_and_starts_at_reservoir_age() {
        let grid = Grid::regular(36, 18, STANDARD_DEPTHS.to_vec()).unwrap();
        let field = SyntheticAgeModel::new(grid).solve(&AgeParams::default()).unwrap();
        let profile = field.depth_profile(PlotPos::new(200.0, -30.0));
        assert!(profile.len() > 10);
        assert!((profile[0].value - 400.0).abs() < 1e-6);
        assert!(profile.windows(2).all(|w| w[1].value >= w[0].value));
    }

    #[test]
    fn continents_are_nan() {
        let grid = Grid::regular(36, 18, STANDARD_DEPTHS.to_vec()).unwrap();
        let field = SyntheticAgeModel::new(grid).solve(&AgeParams::default()).unwrap();
        assert!(field.depth_profile(PlotPos::new(25.0, 10.0)).is_empty());
        assert!(field.depth_profile(PlotPos::new(200.0, -80.0)).is_empty());
    }

    #[test]
    fn bad_parameters_are_reported() {
        let grid = Grid::regular(4, 4, vec![10.0, 100.0]).unwrap();
        let params = AgeParams {
            diffusivity: 0.0,
            ..AgeParams::default()
        };
        assert_eq!(
            SyntheticAgeModel::new(grid).solve(&params).unwrap_err(),
            SolveError::InvalidParameter {
                name: "diffusivity",
                value: 0.0
            }
        );
    }

    #[test]
    fn large_residual_is_not_converged() {
        assert!(check_residual(1e-12, 1e-9).is_ok());
        let err = check_residual(f64::INFINITY, 1e-9).unwrap_err();
        assert!(matches!(err, SolveError::NotConverged { .. }));
        assert!(err.to_string().contains("steady state not reached"));
        // NaN never passes.
        assert!(check_residual(f64::NAN, 1.0).is_err());
    }
}
