//! Weighted least squares trilateration
use nalgebra::{DMatrix, DVector, Matrix4, Vector3, Vector4};

use crate::{cfg::Config, constants::SPEED_OF_LIGHT, error::Error};

/// [ReceiverSolution] of one epoch
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReceiverSolution {
    /// ECEF position [m]
    pub position: Vector3<f64>,
    /// Receiver clock bias, scaled by the speed of light [m]
    pub clock_bias: f64,
    /// Post fit residuals [m]
    pub residuals: DVector<f64>,
    /// A posteriori variance factor σ0².
    /// Undefined (None) when the system has no redundancy (4 observations).
    pub variance: Option<f64>,
    /// Parameters covariance σ0².N⁻¹ (x, y, z, c.dt), None when variance is undefined
    pub covariance: Option<Matrix4<f64>>,
    /// Iterations performed
    pub iterations: usize,
    /// False when the iteration cap was reached first
    pub converged: bool,
}

impl ReceiverSolution {
    /// Receiver clock offset [s]
    pub fn clock_offset(&self) -> f64 {
        self.clock_bias / SPEED_OF_LIGHT
    }
}

/// Gauss-Newton solver of (x, y, z, c.dt) from n >= 4 (position, range) pairs
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Trilaterator {
    /// Measurement standard deviation [m]
    sigma: f64,
    /// Stop criteria
    epsilon: f64,
    /// Iteration cap
    max_iter: usize,
    /// Initial state (x, y, z, c.dt)
    initial: Vector4<f64>,
}

impl Default for Trilaterator {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            epsilon: 1.0E-6,
            max_iter: 20,
            initial: Vector4::zeros(),
        }
    }
}

impl TryFrom<&Config> for Trilaterator {
    type Error = Error;
    fn try_from(cfg: &Config) -> Result<Self, Error> {
        Ok(Self::default()
            .with_sigma(cfg.sigma)?
            .with_epsilon(cfg.lsq_epsilon)
            .with_max_iter(cfg.lsq_max_iter))
    }
}

impl Trilaterator {
    /// Copies and returns with measurement standard deviation [m].
    /// Fails when `sigma` is not strictly positive.
    pub fn with_sigma(&self, sigma: f64) -> Result<Self, Error> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(Error::InvalidSigma(sigma));
        }
        let mut s = *self;
        s.sigma = sigma;
        Ok(s)
    }

    /// Copies and returns with stop criteria: variance variation between
    /// two iterations, or norm of the correction when nothing is redundant.
    pub fn with_epsilon(&self, epsilon: f64) -> Self {
        let mut s = *self;
        s.epsilon = epsilon;
        s
    }

    /// Copies and returns with iteration cap (at least one iteration)
    pub fn with_max_iter(&self, max_iter: usize) -> Self {
        let mut s = *self;
        s.max_iter = max_iter.max(1);
        s
    }

    /// Copies and returns with initial guess: ECEF position [m] and clock bias [m]
    pub fn with_initial_guess(&self, position: Vector3<f64>, clock_bias: f64) -> Self {
        let mut s = *self;
        s.initial = Vector4::new(position[0], position[1], position[2], clock_bias);
        s
    }

    /// Resolves receiver state from satellite positions [m] and observed ranges [m].
    /// Reaching the iteration cap is not an error: the last state is returned,
    /// see [ReceiverSolution::converged].
    pub fn resolve(
        &self,
        satellites: &[Vector3<f64>],
        ranges: &[f64],
    ) -> Result<ReceiverSolution, Error> {
        let n = satellites.len();
        if n != ranges.len() {
            return Err(Error::DimensionMismatch);
        }
        if n < 4 {
            return Err(Error::InsufficientObservations(n));
        }

        let weight = DMatrix::<f64>::identity(n, n) / self.sigma.powi(2);

        let mut x = self.initial;
        let mut inverse = DMatrix::<f64>::identity(4, 4);
        let mut residuals = DVector::<f64>::zeros(n);
        let mut variance = 1.0_f64;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iter {
            let mut a = DMatrix::<f64>::zeros(n, 4);
            let mut b = DVector::<f64>::zeros(n);

            for (i, (sat, range)) in satellites.iter().zip(ranges.iter()).enumerate() {
                let delta = Vector3::new(x[0] - sat[0], x[1] - sat[1], x[2] - sat[2]);
                let rho = delta.norm();
                a[(i, 0)] = delta[0] / rho;
                a[(i, 1)] = delta[1] / rho;
                a[(i, 2)] = delta[2] / rho;
                a[(i, 3)] = 1.0;
                b[i] = range - (rho + x[3]);
            }

            let at_p = a.transpose() * &weight;
            let normal = &at_p * &a;
            inverse = normal.try_inverse().ok_or(Error::MatrixInversion)?;

            let dx = &inverse * (&at_p * &b);
            x += Vector4::new(dx[0], dx[1], dx[2], dx[3]);

            residuals = &b - &a * &dx;
            iterations += 1;

            if n > 4 {
                let previous = variance;
                let vtpv = (residuals.transpose() * &weight * &residuals)[(0, 0)];
                variance = vtpv / (n - 4) as f64;
                if (previous - variance).abs() <= self.epsilon {
                    converged = true;
                    break;
                }
            } else if dx.norm() <= self.epsilon {
                converged = true;
                break;
            }
        }

        let (variance, covariance) = if n > 4 {
            let covariance = Matrix4::from_iterator(inverse.iter().copied()) * variance;
            (Some(variance), Some(covariance))
        } else {
            (None, None)
        };

        Ok(ReceiverSolution {
            position: Vector3::new(x[0], x[1], x[2]),
            clock_bias: x[3],
            residuals,
            variance,
            covariance,
            iterations,
            converged,
        })
    }
}
