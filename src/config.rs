use std::fmt;
use std::path::PathBuf;

use tracing::warn;

use crate::error::{HarnessError, Result};
use crate::kernel::{Algorithm, DEFAULT_BLOCK};
use crate::workload::check_density;

/// Density used for `sparse_csr` when none is given
pub const DEFAULT_DENSITY: f64 = 0.01;

/// Validated benchmark parameters, fixed for the whole run
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkConfig {
    n: usize,
    runs: usize,
    seed: u64,
    algorithm: Algorithm,
    density: Option<f64>,
    block: usize,
    matrix_file: Option<PathBuf>,
}

impl BenchmarkConfig {
    /// Validate raw inputs.
    ///
    /// `n` and `runs` are signed so that negative command-line values are
    /// reported here instead of failing to parse.
    pub fn new(
        n: i64,
        runs: i64,
        seed: u64,
        algorithm: Algorithm,
        density: Option<f64>,
    ) -> Result<Self> {
        if n < 0 {
            return Err(HarnessError::InvalidArgument(format!(
                "n must be >= 0, got {}",
                n
            )));
        }
        if runs < 1 {
            return Err(HarnessError::InvalidArgument(format!(
                "runs must be >= 1, got {}",
                runs
            )));
        }
        let density = if algorithm.is_sparse() {
            let d = density.unwrap_or(DEFAULT_DENSITY);
            check_density(d)?;
            Some(d)
        } else {
            if let Some(d) = density {
                warn!(density = d, %algorithm, "density ignored for dense algorithm");
            }
            None
        };
        Ok(BenchmarkConfig {
            n: n as usize,
            runs: runs as usize,
            seed,
            algorithm,
            density,
            block: DEFAULT_BLOCK,
            matrix_file: None,
        })
    }

    /// Tile side for `dense_blocked`
    pub fn with_block(mut self, block: i64) -> Result<Self> {
        if block < 1 {
            return Err(HarnessError::InvalidArgument(format!(
                "block must be >= 1, got {}",
                block
            )));
        }
        self.block = block as usize;
        Ok(self)
    }

    /// Read the sparse operand from a Matrix Market file instead of generating it
    pub fn with_matrix_file(mut self, path: impl Into<PathBuf>) -> Result<Self> {
        if !self.algorithm.is_sparse() {
            return Err(HarnessError::InvalidArgument(format!(
                "a matrix file requires sparse_csr, not {}",
                self.algorithm
            )));
        }
        self.matrix_file = Some(path.into());
        Ok(self)
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn density(&self) -> Option<f64> {
        self.density
    }

    pub fn block(&self) -> usize {
        self.block
    }

    pub fn matrix_file(&self) -> Option<&PathBuf> {
        self.matrix_file.as_ref()
    }
}

impl fmt::Display for BenchmarkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "algorithm={} n={} runs={} seed={}",
            self.algorithm, self.n, self.runs, self.seed
        )?;
        if let Some(d) = self.density {
            write!(f, " density={}", d)?;
        }
        if self.algorithm == Algorithm::DenseBlocked {
            write!(f, " block={}", self.block)?;
        }
        if let Some(path) = &self.matrix_file {
            write!(f, " matrix_file={}", path.display())?;
        }
        Ok(())
    }
}
