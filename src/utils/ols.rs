//! Simple linear regression with classical inference.
//!
//! Log-linear incidence models reduce to ordinary least squares of log(count)
//! on time, so a single-regressor fit in closed form is all the fitting layer
//! needs. Alongside the coefficients this module provides their standard
//! errors, t-based coefficient intervals, and the pointwise confidence band
//! for the mean response that fitted models report per bin.

use crate::error::{EpicurveError, Result};
use crate::utils::stats::mean;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Guard against numerically degenerate designs.
const DEGENERATE_EPS: f64 = 1e-10;

/// One point of a pointwise interval band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPoint {
    /// Fitted mean response.
    pub fit: f64,
    /// Lower interval bound.
    pub lower: f64,
    /// Upper interval bound.
    pub upper: f64,
}

/// A fitted simple linear regression `y = intercept + slope * x`.
#[derive(Debug, Clone)]
pub struct LinearFit {
    /// Intercept estimate.
    pub intercept: f64,
    /// Slope estimate.
    pub slope: f64,
    /// Standard error of the intercept (0 when `df == 0`).
    pub intercept_se: f64,
    /// Standard error of the slope (0 when `df == 0`).
    pub slope_se: f64,
    /// Residual variance with `n - 2` denominator (0 when `df == 0`).
    pub residual_variance: f64,
    /// Coefficient of determination; 1.0 for an exact fit.
    pub r_squared: f64,
    /// Residual degrees of freedom, `n - 2`.
    pub df: usize,
    n: usize,
    mean_x: f64,
    sxx: f64,
}

/// Fit `y = intercept + slope * x` by ordinary least squares.
///
/// Requires at least two observations and a predictor with non-zero variance.
/// Two observations fit an exact line: coefficients are well defined but the
/// residual degrees of freedom are zero, so standard errors are reported as 0
/// and interval bands collapse onto the fit line.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Result<LinearFit> {
    if x.len() != y.len() {
        return Err(EpicurveError::InvalidInput(format!(
            "regression inputs differ in length: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 2 {
        return Err(EpicurveError::InsufficientData { needed: 2, got: n });
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(EpicurveError::ModelFitFailure(
            "non-finite value in regression input".to_string(),
        ));
    }

    let mean_x = mean(x);
    let mean_y = mean(y);

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if sxx < DEGENERATE_EPS {
        return Err(EpicurveError::ModelFitFailure(
            "zero variance in predictor".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    if !slope.is_finite() || !intercept.is_finite() {
        return Err(EpicurveError::ModelFitFailure(
            "non-finite regression coefficients".to_string(),
        ));
    }

    // SSE = Syy - b * Sxy; clamp tiny negative values from cancellation.
    let sse = (syy - slope * sxy).max(0.0);
    let df = n - 2;
    let residual_variance = if df > 0 { sse / df as f64 } else { 0.0 };
    let slope_se = (residual_variance / sxx).sqrt();
    let intercept_se = (residual_variance * (1.0 / n as f64 + mean_x * mean_x / sxx)).sqrt();
    let r_squared = if syy < DEGENERATE_EPS {
        1.0
    } else {
        1.0 - sse / syy
    };

    Ok(LinearFit {
        intercept,
        slope,
        intercept_se,
        slope_se,
        residual_variance,
        r_squared,
        df,
        n,
        mean_x,
        sxx,
    })
}

impl LinearFit {
    /// Fitted mean response at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Number of observations the regression was fit on.
    pub fn n_observations(&self) -> usize {
        self.n
    }

    /// Standard error of the mean response at `x`.
    pub fn mean_response_se(&self, x: f64) -> f64 {
        let dx = x - self.mean_x;
        (self.residual_variance * (1.0 / self.n as f64 + dx * dx / self.sxx)).sqrt()
    }

    /// Confidence interval for the slope at the given level.
    pub fn slope_interval(&self, level: f64) -> Result<(f64, f64)> {
        let t = self.t_quantile(level)?;
        Ok((self.slope - t * self.slope_se, self.slope + t * self.slope_se))
    }

    /// Pointwise confidence band for the mean response at each `x`.
    ///
    /// This is the interval for E[y | x], not for a new observation; it is
    /// what the fitted-curve overlay on an epidemic curve shows.
    pub fn confidence_band(&self, xs: &[f64], level: f64) -> Result<Vec<BandPoint>> {
        let t = self.t_quantile(level)?;
        Ok(xs
            .iter()
            .map(|&x| {
                let fit = self.predict(x);
                let half = t * self.mean_response_se(x);
                BandPoint {
                    fit,
                    lower: fit - half,
                    upper: fit + half,
                }
            })
            .collect())
    }

    /// Two-sided Student-t quantile for this fit's residual df.
    ///
    /// Zero residual df means the fit is an exact interpolation; the quantile
    /// is reported as 0 so bands collapse onto the fit line.
    fn t_quantile(&self, level: f64) -> Result<f64> {
        if !(level > 0.0 && level < 1.0) {
            return Err(EpicurveError::InvalidInput(format!(
                "confidence level must be in (0, 1), got {level}"
            )));
        }
        if self.df == 0 {
            return Ok(0.0);
        }
        let t = StudentsT::new(0.0, 1.0, self.df as f64).map_err(|e| {
            EpicurveError::ModelFitFailure(format!("t distribution unavailable: {e}"))
        })?;
        Ok(t.inverse_cdf(0.5 + level / 2.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linear_fit_recovers_exact_line() {
        // y = 2 + 3x, no noise
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y: Vec<f64> = x.iter().map(|&v| 2.0 + 3.0 * v).collect();

        let fit = linear_fit(&x, &y).unwrap();

        assert_relative_eq!(fit.intercept, 2.0, epsilon = 1e-10);
        assert_relative_eq!(fit.slope, 3.0, epsilon = 1e-10);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-10);
        assert!(fit.residual_variance < 1e-10);
        assert_relative_eq!(fit.predict(6.0), 20.0, epsilon = 1e-10);
    }

    #[test]
    fn linear_fit_inference_matches_hand_calculation() {
        // x = [0,1,2,3], y = [0,1,2,4]:
        // slope = 1.3, intercept = -0.2, SSE = 0.3, df = 2, s^2 = 0.15,
        // se(slope) = sqrt(0.03), se(intercept) = sqrt(0.105), R^2 = 1 - 0.3/8.75
        let x = vec![0.0, 1.0, 2.0, 3.0];
        let y = vec![0.0, 1.0, 2.0, 4.0];

        let fit = linear_fit(&x, &y).unwrap();

        assert_relative_eq!(fit.slope, 1.3, epsilon = 1e-10);
        assert_relative_eq!(fit.intercept, -0.2, epsilon = 1e-10);
        assert_eq!(fit.df, 2);
        assert_relative_eq!(fit.residual_variance, 0.15, epsilon = 1e-10);
        assert_relative_eq!(fit.slope_se, 0.03_f64.sqrt(), epsilon = 1e-10);
        assert_relative_eq!(fit.intercept_se, 0.105_f64.sqrt(), epsilon = 1e-10);
        assert_relative_eq!(fit.r_squared, 1.0 - 0.3 / 8.75, epsilon = 1e-10);
    }

    #[test]
    fn slope_interval_uses_t_quantile() {
        // Same dataset as above; t(df=2, 0.975) = 4.302653
        let x = vec![0.0, 1.0, 2.0, 3.0];
        let y = vec![0.0, 1.0, 2.0, 4.0];

        let fit = linear_fit(&x, &y).unwrap();
        let (lo, hi) = fit.slope_interval(0.95).unwrap();

        assert_relative_eq!(lo, 1.3 - 4.302653 * 0.03_f64.sqrt(), epsilon = 1e-4);
        assert_relative_eq!(hi, 1.3 + 4.302653 * 0.03_f64.sqrt(), epsilon = 1e-4);
    }

    #[test]
    fn confidence_band_is_narrowest_at_mean_x() {
        let x = vec![0.0, 1.0, 2.0, 3.0];
        let y = vec![0.0, 1.0, 2.0, 4.0];

        let fit = linear_fit(&x, &y).unwrap();
        let band = fit.confidence_band(&[0.0, 1.5, 3.0], 0.95).unwrap();

        // Half-width at the mean of x: t * s * sqrt(1/n)
        let centre_half = band[1].upper - band[1].fit;
        assert_relative_eq!(centre_half, 4.302653 * 0.0375_f64.sqrt(), epsilon = 1e-4);

        // Band widens moving away from mean(x), symmetrically here.
        let left_half = band[0].upper - band[0].fit;
        let right_half = band[2].upper - band[2].fit;
        assert!(left_half > centre_half);
        assert!(right_half > centre_half);
        assert_relative_eq!(left_half, right_half, epsilon = 1e-10);
    }

    #[test]
    fn two_point_fit_is_exact_with_collapsed_band() {
        let x = vec![0.0, 1.0];
        let y = vec![1.0, 3.0];

        let fit = linear_fit(&x, &y).unwrap();

        assert_eq!(fit.df, 0);
        assert_relative_eq!(fit.slope, 2.0, epsilon = 1e-10);
        assert_relative_eq!(fit.slope_se, 0.0, epsilon = 1e-10);

        let band = fit.confidence_band(&[0.0, 0.5, 1.0], 0.95).unwrap();
        for point in band {
            assert_relative_eq!(point.lower, point.fit, epsilon = 1e-10);
            assert_relative_eq!(point.upper, point.fit, epsilon = 1e-10);
        }
    }

    #[test]
    fn linear_fit_rejects_degenerate_inputs() {
        // Too few observations
        assert!(matches!(
            linear_fit(&[1.0], &[2.0]),
            Err(EpicurveError::InsufficientData { needed: 2, got: 1 })
        ));

        // Mismatched lengths
        assert!(matches!(
            linear_fit(&[1.0, 2.0], &[1.0]),
            Err(EpicurveError::InvalidInput(_))
        ));

        // Constant predictor
        assert!(matches!(
            linear_fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]),
            Err(EpicurveError::ModelFitFailure(_))
        ));

        // Non-finite input
        assert!(matches!(
            linear_fit(&[0.0, 1.0, 2.0], &[1.0, f64::NAN, 3.0]),
            Err(EpicurveError::ModelFitFailure(_))
        ));
    }

    #[test]
    fn interval_level_is_validated() {
        let fit = linear_fit(&[0.0, 1.0, 2.0], &[0.0, 1.1, 1.9]).unwrap();
        assert!(matches!(
            fit.slope_interval(0.0),
            Err(EpicurveError::InvalidInput(_))
        ));
        assert!(matches!(
            fit.slope_interval(1.0),
            Err(EpicurveError::InvalidInput(_))
        ));
        assert!(fit.slope_interval(0.5).is_ok());
    }

    #[test]
    fn constant_response_has_unit_r_squared() {
        // Zero slope, zero residuals: an exact (if uninformative) fit.
        let fit = linear_fit(&[0.0, 1.0, 2.0, 3.0], &[5.0, 5.0, 5.0, 5.0]).unwrap();
        assert_relative_eq!(fit.slope, 0.0, epsilon = 1e-10);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-10);
    }
}
