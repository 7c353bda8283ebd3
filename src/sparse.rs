//! Compressed sparse row matrices
//!
//! The only product supported is CSR x dense -> dense. Coordinate-format
//! Matrix Market files can be loaded as CSR for real-world inputs.

use std::io::BufRead;
use std::path::Path;

use crate::error::{HarnessError, Result};
use crate::matrix::Matrix;

/// Largest side accepted from a Matrix Market size line (32-bit signed indices)
const MAX_MTX_DIM: usize = i32::MAX as usize;
const MTX_RESERVE_CAP: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Build a CSR matrix, checking offsets and column bounds
    pub fn new(
        dim: (usize, usize),
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let (rows, cols) = dim;
        if row_ptr.len() != rows + 1 {
            return Err(HarnessError::InvalidArgument(format!(
                "row_ptr has length {}, expected {}",
                row_ptr.len(),
                rows + 1
            )));
        }
        if row_ptr[0] != 0 || row_ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(HarnessError::InvalidArgument(
                "row_ptr must start at 0 and be non-decreasing".to_string(),
            ));
        }
        if col_idx.len() != values.len() || row_ptr[rows] != values.len() {
            return Err(HarnessError::InvalidArgument(format!(
                "row_ptr ends at {}, col_idx has {} entries, values has {}",
                row_ptr[rows],
                col_idx.len(),
                values.len()
            )));
        }
        if let Some(&c) = col_idx.iter().find(|&&c| c >= cols) {
            return Err(HarnessError::InvalidArgument(format!(
                "column index {} out of range for {} columns",
                c, cols
            )));
        }
        Ok(CsrMatrix {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        })
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Fraction of stored entries over all cells, 0 for an empty shape
    pub fn density(&self) -> f64 {
        let cells = self.rows * self.cols;
        if cells == 0 {
            0.0
        } else {
            self.nnz() as f64 / cells as f64
        }
    }

    fn row_entries(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    pub fn to_dense(&self) -> Matrix {
        let mut mat = Matrix::new(self.dim());
        for i in 0..self.rows {
            for (j, v) in self.row_entries(i) {
                mat.set(i, j, mat.get(i, j) + v);
            }
        }
        mat
    }

    /// Leading `k x k` corner, dropping entries outside it
    pub fn leading(&self, k: usize) -> CsrMatrix {
        let rows = k.min(self.rows);
        let cols = k.min(self.cols);
        let mut row_ptr = Vec::with_capacity(rows + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for i in 0..rows {
            for (j, v) in self.row_entries(i).filter(|&(j, _)| j < cols) {
                col_idx.push(j);
                values.push(v);
            }
            row_ptr.push(values.len());
        }
        CsrMatrix {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// CSR x dense product; each stored `a_ik` scales row `k` of `b`
    pub fn mul_dense(a: &CsrMatrix, b: &Matrix) -> Result<Matrix> {
        Matrix::check_inner(a.dim(), b.dim)?;
        let mut mat = Matrix::new((a.rows, b.cols()));
        let width = b.cols();
        for i in 0..a.rows {
            let c_row = &mut mat.data[i * width..(i + 1) * width];
            for (k, a_ik) in a.row_entries(i) {
                for (c, b_kj) in c_row.iter_mut().zip(b.row(k)) {
                    *c += a_ik * b_kj;
                }
            }
        }
        Ok(mat)
    }

    pub fn from_matrix_market_file(path: &Path) -> Result<CsrMatrix> {
        let file = std::fs::File::open(path).map_err(|e| HarnessError::io(path, e))?;
        CsrMatrix::from_matrix_market(std::io::BufReader::new(file), path)
    }

    /// Parse a coordinate Matrix Market stream (1-based indices).
    ///
    /// `path` is only used for error messages. Entries are grouped per row
    /// in file order; pattern files get a value of 1.0 per entry.
    pub fn from_matrix_market<R: BufRead>(reader: R, path: &Path) -> Result<CsrMatrix> {
        let parse_err = |line: usize, message: String| HarnessError::MatrixMarket {
            path: path.to_path_buf(),
            line,
            message,
        };

        let mut pattern = false;
        let mut shape: Option<(usize, usize, usize)> = None;
        let mut triplets: Vec<(usize, usize, f64)> = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let lineno = idx + 1;
            let line = line.map_err(|e| HarnessError::io(path, e))?;
            let trimmed = line.trim();
            if let Some(banner) = trimmed.strip_prefix("%%MatrixMarket") {
                let banner = banner.to_ascii_lowercase();
                if !banner.contains("coordinate") {
                    return Err(parse_err(lineno, "only coordinate format is supported".into()));
                }
                pattern = banner.contains("pattern");
                continue;
            }
            if trimmed.is_empty() || trimmed.starts_with('%') {
                continue;
            }
            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            match shape {
                None => {
                    if fields.len() < 3 {
                        return Err(parse_err(lineno, "expected `rows cols nnz`".into()));
                    }
                    let parse = |s: &str| {
                        s.parse::<usize>()
                            .map_err(|_| parse_err(lineno, format!("invalid size `{}`", s)))
                    };
                    let dims = (parse(fields[0])?, parse(fields[1])?, parse(fields[2])?);
                    if dims.0 > MAX_MTX_DIM || dims.1 > MAX_MTX_DIM {
                        return Err(parse_err(
                            lineno,
                            format!("size {}x{} exceeds {} per side", dims.0, dims.1, MAX_MTX_DIM),
                        ));
                    }
                    if dims.0.checked_mul(dims.1).is_some_and(|cells| dims.2 > cells) {
                        return Err(parse_err(
                            lineno,
                            format!("{} entries do not fit a {}x{} matrix", dims.2, dims.0, dims.1),
                        ));
                    }
                    // The header's count is only a hint; the file may be truncated
                    triplets.reserve(dims.2.min(MTX_RESERVE_CAP));
                    shape = Some(dims);
                }
                Some((rows, cols, _)) => {
                    let needed = if pattern { 2 } else { 3 };
                    if fields.len() < needed {
                        return Err(parse_err(lineno, "incomplete entry".into()));
                    }
                    let index = |s: &str, bound: usize| match s.parse::<usize>() {
                        Ok(v) if v >= 1 && v <= bound => Ok(v - 1),
                        _ => Err(parse_err(lineno, format!("index `{}` out of range", s))),
                    };
                    let i = index(fields[0], rows)?;
                    let j = index(fields[1], cols)?;
                    let v = if pattern {
                        1.0
                    } else {
                        fields[2]
                            .parse::<f64>()
                            .map_err(|_| parse_err(lineno, format!("invalid value `{}`", fields[2])))?
                    };
                    triplets.push((i, j, v));
                }
            }
        }

        let (rows, cols, _) = shape.ok_or_else(|| parse_err(0, "missing size line".into()))?;
        Ok(CsrMatrix::from_triplets((rows, cols), &triplets))
    }

    /// Counting sort of in-range triplets into row order
    fn from_triplets(dim: (usize, usize), triplets: &[(usize, usize, f64)]) -> CsrMatrix {
        let (rows, cols) = dim;
        let mut row_ptr = vec![0usize; rows + 1];
        for &(i, _, _) in triplets {
            row_ptr[i + 1] += 1;
        }
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }
        let mut offset = row_ptr.clone();
        let mut col_idx = vec![0usize; triplets.len()];
        let mut values = vec![0.0; triplets.len()];
        for &(i, j, v) in triplets {
            let pos = offset[i];
            offset[i] += 1;
            col_idx[pos] = j;
            values[pos] = v;
        }
        CsrMatrix {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }
}
