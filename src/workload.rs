//! Seeded workload generation
//!
//! Every generator draws from a single `StdRng` seeded with the caller's
//! seed, so the same arguments always produce bit-identical operands.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{HarnessError, Result};
use crate::matrix::Matrix;
use crate::sparse::CsrMatrix;

/// Columns of the dense operand paired with a loaded sparse matrix
const LOADED_B_COLS: usize = 64;
/// Narrower dense operand for very tall loaded matrices
const LOADED_B_COLS_TALL: usize = 32;
const TALL_ROWS: usize = 200_000;

pub fn rand_matrix<R: Rng>(dim: (usize, usize), rng: &mut R) -> Matrix {
    let mut mat = Matrix::new(dim);
    for v in mat.data.iter_mut() {
        *v = rng.gen::<f64>();
    }
    mat
}

/// Two dense `n x n` operands with entries in `[0, 1)`
pub fn generate(n: usize, seed: u64) -> Result<(Matrix, Matrix)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let a = rand_matrix((n, n), &mut rng);
    let b = rand_matrix((n, n), &mut rng);
    Ok((a, b))
}

pub fn check_density(density: f64) -> Result<()> {
    if !(density > 0.0 && density <= 1.0) {
        return Err(HarnessError::InvalidArgument(format!(
            "density must be in (0, 1], got {}",
            density
        )));
    }
    Ok(())
}

/// Sparse `n x n` matrix where each cell is kept with probability `density`.
///
/// Kept cells get a value in `(0, 1]`, so no stored entry is zero. Column
/// indices come out sorted within each row.
pub fn generate_csr<R: Rng>(n: usize, density: f64, rng: &mut R) -> Result<CsrMatrix> {
    check_density(density)?;
    let mut row_ptr = Vec::with_capacity(n + 1);
    let mut col_idx = Vec::new();
    let mut values = Vec::new();
    row_ptr.push(0);
    for _ in 0..n {
        for j in 0..n {
            if rng.gen_bool(density) {
                col_idx.push(j);
                values.push(1.0 - rng.gen::<f64>());
            }
        }
        row_ptr.push(values.len());
    }
    CsrMatrix::new((n, n), row_ptr, col_idx, values)
}

/// Sparse A and dense B, both `n x n`, from one seeded source
pub fn generate_sparse(n: usize, density: f64, seed: u64) -> Result<(CsrMatrix, Matrix)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let a = generate_csr(n, density, &mut rng)?;
    let b = rand_matrix((n, n), &mut rng);
    Ok((a, b))
}

/// Sparse A from a Matrix Market file and a seeded dense B sized to match
pub fn load_sparse(path: &Path, seed: u64) -> Result<(CsrMatrix, Matrix)> {
    let a = CsrMatrix::from_matrix_market_file(path)?;
    let (rows, cols) = a.dim();
    let b_cols = if rows > TALL_ROWS {
        LOADED_B_COLS_TALL
    } else {
        cols.clamp(1, LOADED_B_COLS)
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let b = rand_matrix((cols, b_cols), &mut rng);
    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    #[test]
    fn test_generate_is_deterministic() {
        let (a1, b1) = generate(16, 42).unwrap();
        let (a2, b2) = generate(16, 42).unwrap();
        assert_eq!(a1.data, a2.data);
        assert_eq!(b1.data, b2.data);
        assert_ne!(a1.data, b1.data);
        assert!(a1.data.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_generate_seed_changes_output() {
        let (a1, _) = generate(8, 1).unwrap();
        let (a2, _) = generate(8, 2).unwrap();
        assert_ne!(a1.data, a2.data);
    }

    #[test]
    fn test_generate_empty() {
        let (a, b) = generate(0, 7).unwrap();
        assert_eq!(a.dim, (0, 0));
        assert_eq!(b.dim, (0, 0));
    }

    #[test]
    fn test_generate_sparse_rejects_density() {
        for density in [0.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                generate_sparse(4, density, 1),
                Err(HarnessError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_generate_sparse_deterministic() {
        let (a1, b1) = generate_sparse(50, 0.1, 9).unwrap();
        let (a2, b2) = generate_sparse(50, 0.1, 9).unwrap();
        assert_eq!(a1, a2);
        assert_eq!(b1, b2);
        assert!(a1.values().iter().all(|&v| v > 0.0 && v <= 1.0));
    }

    #[test]
    fn test_full_density_is_dense() {
        let (a, _) = generate_sparse(10, 1.0, 3).unwrap();
        assert_eq!(a.nnz(), 100);
    }

    #[test]
    fn test_sparse_density_within_tolerance() {
        let n = 1000;
        for &density in &[0.01, 0.2] {
            let mut total = 0.0;
            let trials = 10;
            for seed in 0..trials {
                let mut rng = StdRng::seed_from_u64(seed);
                let a = generate_csr(n, density, &mut rng).unwrap();
                let observed = a.density();
                assert!(
                    (observed - density).abs() <= 0.01,
                    "seed {} density {} observed {}",
                    seed,
                    density,
                    observed
                );
                total += observed;
            }
            assert!((total / trials as f64 - density).abs() <= 0.01);
        }
    }

    #[test]
    fn test_load_sparse() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "%%MatrixMarket matrix coordinate real general").unwrap();
        writeln!(file, "3 100 2").unwrap();
        writeln!(file, "1 1 0.5").unwrap();
        writeln!(file, "3 100 1.5").unwrap();
        file.flush().unwrap();

        let (a, b) = load_sparse(file.path(), 5).unwrap();
        assert_eq!(a.dim(), (3, 100));
        assert_eq!(b.dim, (100, 64));
        let (_, b2) = load_sparse(file.path(), 5).unwrap();
        assert_eq!(b, b2);
    }

    #[test]
    fn test_load_sparse_missing_file() {
        let err = load_sparse(Path::new("/nonexistent/matrix.mtx"), 1).unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn prop_generate_deterministic(n in 0usize..24, seed in any::<u64>()) {
            let first = generate(n, seed).unwrap();
            let second = generate(n, seed).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
