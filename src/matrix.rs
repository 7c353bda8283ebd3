use crate::error::{HarnessError, Result};

/// Dense matrix of f64, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub data: Vec<f64>,
    pub dim: (usize, usize),
}

const UNROLL: usize = 4;

impl Matrix {
    pub fn new(dim: (usize, usize)) -> Self {
        Matrix {
            data: vec![0.0; dim.0 * dim.1],
            dim,
        }
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(HarnessError::InvalidArgument(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Matrix {
            data,
            dim: (rows.len(), cols),
        })
    }

    pub fn rows(&self) -> usize {
        self.dim.0
    }

    pub fn cols(&self) -> usize {
        self.dim.1
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim.1 + j]
    }

    pub fn set(&mut self, i: usize, j: usize, val: f64) {
        self.data[i * self.dim.1 + j] = val;
    }

    pub fn row(&self, idx: usize) -> &[f64] {
        let start = idx * self.dim.1;
        &self.data[start..start + self.dim.1]
    }

    fn row_mut(&mut self, idx: usize) -> &mut [f64] {
        let start = idx * self.dim.1;
        let cols = self.dim.1;
        &mut self.data[start..start + cols]
    }

    /// Copy of the leading `k x k` corner, clamped to the matrix shape
    pub fn leading(&self, k: usize) -> Matrix {
        let rows = k.min(self.dim.0);
        let cols = k.min(self.dim.1);
        let mut mat = Matrix::new((rows, cols));
        for i in 0..rows {
            mat.row_mut(i).copy_from_slice(&self.row(i)[..cols]);
        }
        mat
    }

    pub(crate) fn check_inner(a: (usize, usize), b: (usize, usize)) -> Result<()> {
        if a.1 != b.0 {
            return Err(HarnessError::DimensionMismatch { left: a, right: b });
        }
        Ok(())
    }

    /// Textbook `C[i][j] = sum_k A[i][k] * B[k][j]`, one dot product per cell
    pub fn reference_mul(a: &Matrix, b: &Matrix) -> Result<Matrix> {
        Matrix::check_inner(a.dim, b.dim)?;
        let mut mat = Matrix::new((a.dim.0, b.dim.1));
        for i in 0..a.dim.0 {
            let row = a.row(i);
            for j in 0..b.dim.1 {
                let mut sum = 0.0;
                for (k, x) in row.iter().enumerate() {
                    sum += x * b.get(k, j);
                }
                mat.set(i, j, sum);
            }
        }
        Ok(mat)
    }

    /// Row-major i-k-j triple loop
    pub fn naive_mul(a: &Matrix, b: &Matrix) -> Result<Matrix> {
        Matrix::check_inner(a.dim, b.dim)?;
        let mut mat = Matrix::new((a.dim.0, b.dim.1));
        for i in 0..a.dim.0 {
            let a_row = a.row(i);
            let c_row = mat.row_mut(i);
            for (k, a_ik) in a_row.iter().enumerate() {
                for (c, b_kj) in c_row.iter_mut().zip(b.row(k)) {
                    *c += a_ik * b_kj;
                }
            }
        }
        Ok(mat)
    }

    /// i-k-j loop tiled into `block x block` squares
    pub fn blocked_mul(a: &Matrix, b: &Matrix, block: usize) -> Result<Matrix> {
        Matrix::check_inner(a.dim, b.dim)?;
        if block == 0 {
            return Err(HarnessError::InvalidArgument(
                "block size must be >= 1".to_string(),
            ));
        }
        let (n, inner, m) = (a.dim.0, a.dim.1, b.dim.1);
        let mut mat = Matrix::new((n, m));
        for ii in (0..n).step_by(block) {
            let i_max = (ii + block).min(n);
            for kk in (0..inner).step_by(block) {
                let k_max = (kk + block).min(inner);
                for jj in (0..m).step_by(block) {
                    let j_max = (jj + block).min(m);
                    for i in ii..i_max {
                        let a_row = a.row(i);
                        let c_row = &mut mat.row_mut(i)[jj..j_max];
                        for k in kk..k_max {
                            let a_ik = a_row[k];
                            for (c, b_kj) in c_row.iter_mut().zip(&b.row(k)[jj..j_max]) {
                                *c += a_ik * b_kj;
                            }
                        }
                    }
                }
            }
        }
        Ok(mat)
    }

    /// i-k-j loop with the inner j loop unrolled by four
    pub fn unrolled_mul(a: &Matrix, b: &Matrix) -> Result<Matrix> {
        Matrix::check_inner(a.dim, b.dim)?;
        let mut mat = Matrix::new((a.dim.0, b.dim.1));
        for i in 0..a.dim.0 {
            let a_row = a.row(i);
            let c_row = mat.row_mut(i);
            for (k, &a_ik) in a_row.iter().enumerate() {
                Matrix::axpy_unrolled(a_ik, b.row(k), c_row);
            }
        }
        Ok(mat)
    }

    /// `output += scalar * vec`, four lanes per step then a scalar tail
    fn axpy_unrolled(scalar: f64, vec: &[f64], output: &mut [f64]) {
        let mut out_chunks = output.chunks_exact_mut(UNROLL);
        let mut vec_chunks = vec.chunks_exact(UNROLL);
        for (c, v) in (&mut out_chunks).zip(&mut vec_chunks) {
            c[0] += scalar * v[0];
            c[1] += scalar * v[1];
            c[2] += scalar * v[2];
            c[3] += scalar * v[3];
        }
        for (c, v) in out_chunks
            .into_remainder()
            .iter_mut()
            .zip(vec_chunks.remainder())
        {
            *c += scalar * v;
        }
    }

    /// Largest cell difference between two equally-shaped matrices, scaled by
    /// `max(|x|, |y|, 1)`.
    ///
    /// Relative for cells of magnitude >= 1 and absolute below that, so cells
    /// summing to (near) zero do not blow the ratio up.
    pub fn max_scaled_diff(&self, other: &Matrix) -> f64 {
        assert_eq!(self.dim, other.dim);
        self.data
            .iter()
            .zip(&other.data)
            .map(|(x, y)| {
                let scale = x.abs().max(y.abs()).max(1.0);
                (x - y).abs() / scale
            })
            .fold(0.0, f64::max)
    }
}
