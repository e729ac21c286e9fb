//! Compressed Sparse Row (CSR) matrix format
//!
//! CSR format stores:
//! - `values`: Non-zero entries in row-major order
//! - `col_indices`: Column index for each value
//! - `row_ptrs`: Index into values/col_indices where each row starts
//!
//! Global FEM matrices are first collected as COO triplets ([`CooMatrix`]) and
//! compressed once; duplicate `(row, col)` pairs are summed, which is how the
//! contributions of elements sharing a node combine.

use crate::traits::ComplexField;
use ndarray::{Array1, Array2};
use num_traits::Zero;
use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Compressed Sparse Row (CSR) matrix format
#[derive(Debug, Clone)]
pub struct CsrMatrix<T: ComplexField> {
    /// Number of rows
    pub num_rows: usize,
    /// Number of columns
    pub num_cols: usize,
    /// Non-zero values in row-major order
    pub values: Vec<T>,
    /// Column indices for each value
    pub col_indices: Vec<usize>,
    /// Row pointers: row_ptrs[i] is the start index in values/col_indices for row i
    /// row_ptrs[num_rows] = nnz (total number of non-zeros)
    pub row_ptrs: Vec<usize>,
}

impl<T: ComplexField> CsrMatrix<T> {
    /// Create a new empty CSR matrix
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_ptrs: vec![0; num_rows + 1],
        }
    }

    /// Create a CSR matrix from COO (Coordinate) format triplets
    ///
    /// Triplets are (row, col, value). Duplicate entries are summed.
    pub fn from_triplets(
        num_rows: usize,
        num_cols: usize,
        mut triplets: Vec<(usize, usize, T)>,
    ) -> Self {
        if triplets.is_empty() {
            return Self::new(num_rows, num_cols);
        }

        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut values = Vec::with_capacity(triplets.len());
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut row_counts = vec![0usize; num_rows];

        let mut prev = (usize::MAX, usize::MAX);
        for (row, col, val) in triplets {
            if (row, col) == prev {
                if let Some(last) = values.last_mut() {
                    *last += val;
                }
            } else {
                values.push(val);
                col_indices.push(col);
                row_counts[row] += 1;
                prev = (row, col);
            }
        }

        let mut row_ptrs = Vec::with_capacity(num_rows + 1);
        row_ptrs.push(0);
        for count in row_counts {
            let last = row_ptrs[row_ptrs.len() - 1];
            row_ptrs.push(last + count);
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Create a CSR matrix from a dense matrix
    ///
    /// Only stores entries with magnitude > threshold
    pub fn from_dense(dense: &Array2<T>, threshold: T::Real) -> Self {
        let num_rows = dense.nrows();
        let num_cols = dense.ncols();

        let mut values = Vec::new();
        let mut col_indices = Vec::new();
        let mut row_ptrs = vec![0usize; num_rows + 1];

        for i in 0..num_rows {
            for j in 0..num_cols {
                let val = dense[[i, j]];
                if val.norm() > threshold {
                    values.push(val);
                    col_indices.push(j);
                }
            }
            row_ptrs[i + 1] = values.len();
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Get the range of indices in values/col_indices for a given row
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.row_ptrs[row]..self.row_ptrs[row + 1]
    }

    /// Get the (col, value) pairs for a row
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let range = self.row_range(row);
        self.col_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Iterate over all stored `(row, col, value)` entries
    pub fn triplet_iter(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.num_rows).flat_map(move |row| {
            self.row_entries(row).map(move |(col, val)| (row, col, val))
        })
    }

    /// Matrix-vector product: y = A * x
    ///
    /// Uses parallel processing when the `rayon` feature is enabled and the
    /// matrix is large enough to benefit from parallelization.
    pub fn matvec(&self, x: &Array1<T>) -> Array1<T> {
        assert_eq!(x.len(), self.num_cols, "Input vector size mismatch");

        #[cfg(feature = "rayon")]
        {
            if self.num_rows >= 246 {
                return self.matvec_parallel(x);
            }
        }

        self.matvec_sequential(x)
    }

    fn matvec_sequential(&self, x: &Array1<T>) -> Array1<T> {
        let mut y = Array1::from_elem(self.num_rows, T::zero());

        for i in 0..self.num_rows {
            let mut sum = T::zero();
            for idx in self.row_range(i) {
                sum += self.values[idx] * x[self.col_indices[idx]];
            }
            y[i] = sum;
        }

        y
    }

    #[cfg(feature = "rayon")]
    fn matvec_parallel(&self, x: &Array1<T>) -> Array1<T> {
        let results: Vec<T> = (0..self.num_rows)
            .into_par_iter()
            .map(|i| {
                let mut sum = T::zero();
                for idx in self.row_range(i) {
                    sum += self.values[idx] * x[self.col_indices[idx]];
                }
                sum
            })
            .collect();

        Array1::from_vec(results)
    }

    /// Sparse-dense product `A · B`
    ///
    /// Used to project a sparse operator onto a dense basis.
    pub fn matmul_dense(&self, b: &Array2<T>) -> Array2<T> {
        assert_eq!(b.nrows(), self.num_cols, "Input matrix size mismatch");

        let mut c = Array2::from_elem((self.num_rows, b.ncols()), T::zero());
        for i in 0..self.num_rows {
            for idx in self.row_range(i) {
                let a = self.values[idx];
                let row_b = b.row(self.col_indices[idx]);
                for (c_ij, &b_kj) in c.row_mut(i).iter_mut().zip(row_b.iter()) {
                    *c_ij += a * b_kj;
                }
            }
        }
        c
    }

    /// Get element at (i, j), returns 0 if not stored
    pub fn get(&self, i: usize, j: usize) -> T {
        self.row_entries(i)
            .find(|&(col, _)| col == j)
            .map(|(_, val)| val)
            .unwrap_or_else(T::zero)
    }

    /// Apply `f` to every stored value, producing a matrix with the same pattern
    pub fn map<U: ComplexField>(&self, f: impl Fn(T) -> U) -> CsrMatrix<U> {
        CsrMatrix {
            num_rows: self.num_rows,
            num_cols: self.num_cols,
            values: self.values.iter().map(|&v| f(v)).collect(),
            col_indices: self.col_indices.clone(),
            row_ptrs: self.row_ptrs.clone(),
        }
    }

    /// Extract the sub-matrix `A[rows, cols]`
    ///
    /// `rows` and `cols` list the kept indices in the order they appear in the
    /// result. This is the kernel of the row/column elimination used to remove
    /// prescribed degrees of freedom.
    pub fn extract(&self, rows: &[usize], cols: &[usize]) -> CsrMatrix<T> {
        let mut col_position = vec![usize::MAX; self.num_cols];
        for (new_col, &old_col) in cols.iter().enumerate() {
            col_position[old_col] = new_col;
        }

        let mut values = Vec::new();
        let mut col_indices = Vec::new();
        let mut row_ptrs = Vec::with_capacity(rows.len() + 1);
        row_ptrs.push(0);

        for &old_row in rows {
            let mut entries: Vec<(usize, T)> = self
                .row_entries(old_row)
                .filter_map(|(col, val)| {
                    let pos = col_position[col];
                    (pos != usize::MAX).then_some((pos, val))
                })
                .collect();
            entries.sort_by_key(|&(col, _)| col);
            for (col, val) in entries {
                col_indices.push(col);
                values.push(val);
            }
            row_ptrs.push(values.len());
        }

        CsrMatrix {
            num_rows: rows.len(),
            num_cols: cols.len(),
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Compute `Σ αᵢ Aᵢ` for matrices of identical shape
    ///
    /// # Panics
    ///
    /// Panics if the terms do not share the same dimensions.
    pub fn linear_combination(terms: &[(T, &CsrMatrix<T>)]) -> CsrMatrix<T> {
        let Some((_, first)) = terms.first() else {
            return CsrMatrix::new(0, 0);
        };
        let (num_rows, num_cols) = (first.num_rows, first.num_cols);

        let capacity = terms.iter().map(|(_, m)| m.nnz()).sum();
        let mut triplets = Vec::with_capacity(capacity);
        for (alpha, matrix) in terms {
            assert_eq!(
                (matrix.num_rows, matrix.num_cols),
                (num_rows, num_cols),
                "linear combination of matrices with different shapes"
            );
            triplets.extend(
                matrix
                    .triplet_iter()
                    .map(|(row, col, val)| (row, col, *alpha * val)),
            );
        }

        CsrMatrix::from_triplets(num_rows, num_cols, triplets)
    }

    /// Check `A == A^T` entry-wise within `tol`
    pub fn is_symmetric(&self, tol: T::Real) -> bool {
        self.num_rows == self.num_cols
            && self
                .triplet_iter()
                .all(|(row, col, val)| (val - self.get(col, row)).norm() <= tol)
    }

    /// Convert to dense matrix (for direct solves and small matrices)
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem((self.num_rows, self.num_cols), T::zero());

        for (row, col, val) in self.triplet_iter() {
            dense[[row, col]] = val;
        }

        dense
    }
}

/// Coordinate-format accumulator used during assembly
///
/// Entries are only appended; duplicates are resolved when converting to CSR.
#[derive(Debug, Clone)]
pub struct CooMatrix<T: ComplexField> {
    num_rows: usize,
    num_cols: usize,
    triplets: Vec<(usize, usize, T)>,
}

impl<T: ComplexField> CooMatrix<T> {
    /// Create an empty accumulator
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            triplets: Vec::new(),
        }
    }

    /// Create an empty accumulator with capacity for `nnz_estimate` entries
    pub fn with_capacity(num_rows: usize, num_cols: usize, nnz_estimate: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            triplets: Vec::with_capacity(nnz_estimate),
        }
    }

    /// Append a single entry; zero values are skipped
    pub fn push(&mut self, row: usize, col: usize, value: T) {
        debug_assert!(row < self.num_rows && col < self.num_cols);
        if !value.is_zero() {
            self.triplets.push((row, col, value));
        }
    }

    /// Append parallel `(rows, cols, values)` arrays as produced by the
    /// broadcast index construction of the mesh
    ///
    /// # Panics
    ///
    /// Panics if the three slices differ in length.
    pub fn extend_from_arrays(&mut self, rows: &[usize], cols: &[usize], values: &[T]) {
        assert_eq!(rows.len(), cols.len(), "row/col index length mismatch");
        assert_eq!(rows.len(), values.len(), "index/value length mismatch");
        for ((&row, &col), &value) in rows.iter().zip(cols).zip(values) {
            self.push(row, col, value);
        }
    }

    /// Number of accumulated (possibly duplicate) entries
    pub fn len(&self) -> usize {
        self.triplets.len()
    }

    /// Whether no entry has been accumulated
    pub fn is_empty(&self) -> bool {
        self.triplets.is_empty()
    }

    /// Compress into CSR, summing duplicates
    pub fn into_csr(self) -> CsrMatrix<T> {
        CsrMatrix::from_triplets(self.num_rows, self.num_cols, self.triplets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use num_complex::Complex64;

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[test]
    fn test_csr_from_triplets() {
        let triplets = vec![
            (2, 2, c(5.0)),
            (0, 2, c(2.0)),
            (0, 0, c(1.0)),
            (2, 0, c(4.0)),
            (1, 1, c(3.0)),
        ];

        let csr = CsrMatrix::from_triplets(3, 3, triplets);

        assert_eq!(csr.nnz(), 5);
        assert_eq!(csr.row_ptrs, vec![0, 2, 3, 5]);
        assert_relative_eq!(csr.get(0, 2).re, 2.0);
        assert_relative_eq!(csr.get(2, 0).re, 4.0);
    }

    #[test]
    fn test_csr_triplets_duplicate_are_summed() {
        let triplets = vec![(0, 0, c(1.0)), (1, 1, c(3.0)), (0, 0, c(2.0))];

        let csr = CsrMatrix::from_triplets(2, 2, triplets);

        assert_eq!(csr.nnz(), 2);
        assert_relative_eq!(csr.get(0, 0).re, 3.0);
    }

    #[test]
    fn test_csr_empty_rows_keep_pointers_consistent() {
        let csr = CsrMatrix::from_triplets(4, 4, vec![(3, 1, 2.0_f64)]);
        assert_eq!(csr.row_ptrs, vec![0, 0, 0, 0, 1]);
        assert_relative_eq!(csr.get(3, 1), 2.0);
        assert_relative_eq!(csr.get(0, 0), 0.0);
    }

    #[test]
    fn test_csr_matvec() {
        let dense = array![[c(1.0), c(2.0)], [c(3.0), c(4.0)]];
        let csr = CsrMatrix::from_dense(&dense, 1e-15);
        let y = csr.matvec(&array![c(1.0), c(2.0)]);

        assert_relative_eq!(y[0].re, 5.0, epsilon = 1e-10);
        assert_relative_eq!(y[1].re, 11.0, epsilon = 1e-10);
    }

    #[test]
    fn test_extract_removes_rows_and_columns() {
        let dense = array![[1.0_f64, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let csr = CsrMatrix::from_dense(&dense, 0.0);

        let sub = csr.extract(&[0, 2], &[2, 0]);
        assert_eq!((sub.num_rows, sub.num_cols), (2, 2));
        assert_relative_eq!(sub.get(0, 0), 3.0);
        assert_relative_eq!(sub.get(0, 1), 1.0);
        assert_relative_eq!(sub.get(1, 0), 9.0);
        assert_relative_eq!(sub.get(1, 1), 7.0);
    }

    #[test]
    fn test_linear_combination() {
        let a = CsrMatrix::from_triplets(2, 2, vec![(0, 0, c(1.0)), (1, 1, c(1.0))]);
        let b = CsrMatrix::from_triplets(2, 2, vec![(0, 1, c(2.0)), (1, 1, c(3.0))]);

        let sum = CsrMatrix::linear_combination(&[(c(2.0), &a), (Complex64::new(0.0, 1.0), &b)]);
        assert_relative_eq!(sum.get(0, 0).re, 2.0);
        assert_relative_eq!(sum.get(0, 1).im, 2.0);
        assert_relative_eq!(sum.get(1, 1).re, 2.0);
        assert_relative_eq!(sum.get(1, 1).im, 3.0);
    }

    #[test]
    fn test_coo_accumulates_shared_entries() {
        let mut coo = CooMatrix::new(3, 3);
        coo.extend_from_arrays(&[0, 0, 1, 1], &[0, 1, 0, 1], &[1.0, -1.0, -1.0, 1.0]);
        coo.extend_from_arrays(&[1, 1, 2, 2], &[1, 2, 1, 2], &[1.0, -1.0, -1.0, 1.0]);
        coo.push(2, 2, 0.0);
        assert_eq!(coo.len(), 8);

        let csr = coo.into_csr();
        assert_relative_eq!(csr.get(1, 1), 2.0);
        assert_relative_eq!(csr.get(2, 2), 1.0);
        assert!(csr.is_symmetric(1e-14));
    }

    #[test]
    fn test_matmul_dense_matches_dense_product() {
        let dense = array![[1.0_f64, 0.0, 2.0], [0.0, 3.0, 0.0]];
        let csr = CsrMatrix::from_dense(&dense, 0.0);
        let basis = array![[1.0_f64, 2.0], [0.5, -1.0], [0.0, 4.0]];

        let product = csr.matmul_dense(&basis);
        let expected = dense.dot(&basis);
        assert_eq!(product.dim(), (2, 2));
        for (a, b) in product.iter().zip(expected.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_map_preserves_pattern() {
        let csr = CsrMatrix::from_triplets(2, 2, vec![(0, 1, 2.0_f64), (1, 0, -1.0)]);
        let complex = csr.map(|v| Complex64::new(v, v));
        assert_eq!(complex.col_indices, csr.col_indices);
        assert_relative_eq!(complex.get(0, 1).im, 2.0);
    }
}
