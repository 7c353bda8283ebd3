use std::fmt;
use std::str::FromStr;

use crate::error::{HarnessError, Result};
use crate::matrix::Matrix;
use crate::sparse::CsrMatrix;

/// Default tile side for `dense_blocked`
pub const DEFAULT_BLOCK: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    DenseNaive,
    DenseBlocked,
    DenseUnrolled,
    SparseCsr,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::DenseNaive,
        Algorithm::DenseBlocked,
        Algorithm::DenseUnrolled,
        Algorithm::SparseCsr,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::DenseNaive => "dense_naive",
            Algorithm::DenseBlocked => "dense_blocked",
            Algorithm::DenseUnrolled => "dense_unrolled",
            Algorithm::SparseCsr => "sparse_csr",
        }
    }

    pub fn is_sparse(self) -> bool {
        self == Algorithm::SparseCsr
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        // Older result files used the `dense_ijk` / `dense_block` / `dense_unroll` names
        match s {
            "dense_naive" | "dense_ijk" => Ok(Algorithm::DenseNaive),
            "dense_blocked" | "dense_block" => Ok(Algorithm::DenseBlocked),
            "dense_unrolled" | "dense_unroll" => Ok(Algorithm::DenseUnrolled),
            "sparse_csr" => Ok(Algorithm::SparseCsr),
            other => Err(HarnessError::InvalidArgument(format!(
                "unknown algorithm `{}` (expected one of dense_naive, dense_blocked, dense_unrolled, sparse_csr)",
                other
            ))),
        }
    }
}

/// The pair of operands a kernel consumes
#[derive(Debug, Clone, PartialEq)]
pub enum Workload {
    Dense { a: Matrix, b: Matrix },
    Sparse { a: CsrMatrix, b: Matrix },
}

impl Workload {
    /// Rows of the left operand
    pub fn n(&self) -> usize {
        match self {
            Workload::Dense { a, .. } => a.rows(),
            Workload::Sparse { a, .. } => a.dim().0,
        }
    }

    /// Leading `k x k` corner of both operands, used for warmup
    pub fn leading(&self, k: usize) -> Workload {
        match self {
            Workload::Dense { a, b } => Workload::Dense {
                a: a.leading(k),
                b: b.leading(k),
            },
            Workload::Sparse { a, b } => Workload::Sparse {
                a: a.leading(k),
                b: b.leading(k),
            },
        }
    }
}

/// Run one kernel over a workload
pub fn multiply(algorithm: Algorithm, workload: &Workload, block: usize) -> Result<Matrix> {
    match (algorithm, workload) {
        (Algorithm::DenseNaive, Workload::Dense { a, b }) => Matrix::naive_mul(a, b),
        (Algorithm::DenseBlocked, Workload::Dense { a, b }) => Matrix::blocked_mul(a, b, block),
        (Algorithm::DenseUnrolled, Workload::Dense { a, b }) => Matrix::unrolled_mul(a, b),
        (Algorithm::SparseCsr, Workload::Sparse { a, b }) => CsrMatrix::mul_dense(a, b),
        (algorithm, _) => Err(HarnessError::InvalidArgument(format!(
            "{} cannot run on a {} workload",
            algorithm,
            if algorithm.is_sparse() { "dense" } else { "sparse" }
        ))),
    }
}
