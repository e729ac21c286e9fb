//! Row/column elimination of prescribed DOFs
//!
//! With the DOFs split into free (f) and prescribed (p) sets, the reduced
//! system is `A_ff u_f = F_f − A_fp u_p`; its size equals the free DOF count.

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use solvers::{ComplexField, CsrMatrix};

/// Split of a system's DOFs into free and prescribed sets, both sorted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DofPartition {
    pub free: Vec<usize>,
    pub prescribed: Vec<usize>,
    num_dofs: usize,
}

/// Reduced system of one frequency sample
#[derive(Debug, Clone)]
pub struct ReducedSystem {
    /// `A_ff`
    pub matrix: CsrMatrix<Complex64>,
    /// `F_f − A_fp u_p`
    pub rhs: Array1<Complex64>,
}

impl DofPartition {
    /// Partition `0..num_dofs`; out-of-range and repeated entries are ignored
    pub fn new(num_dofs: usize, prescribed: impl IntoIterator<Item = usize>) -> Self {
        let mut is_prescribed = vec![false; num_dofs];
        for dof in prescribed {
            if dof < num_dofs {
                is_prescribed[dof] = true;
            }
        }
        let (prescribed, free): (Vec<usize>, Vec<usize>) = (0..num_dofs).partition(|&dof| is_prescribed[dof]);
        Self {
            free,
            prescribed,
            num_dofs,
        }
    }

    pub fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    pub fn num_free(&self) -> usize {
        self.free.len()
    }

    /// Values of `full` at the free DOFs
    pub fn restrict<T: ComplexField>(&self, full: &Array1<T>) -> Array1<T> {
        self.free.iter().map(|&dof| full[dof]).collect()
    }

    /// Full vector from free values and prescribed values (in partition order)
    pub fn expand<T: ComplexField>(&self, free_values: &Array1<T>, prescribed_values: &Array1<T>) -> Array1<T> {
        let mut full = Array1::from_elem(self.num_dofs, T::zero());
        for (&dof, &value) in self.free.iter().zip(free_values) {
            full[dof] = value;
        }
        for (&dof, &value) in self.prescribed.iter().zip(prescribed_values) {
            full[dof] = value;
        }
        full
    }

    /// Columns of a free-DOF basis expanded to full length, prescribed rows zero
    pub fn expand_columns(&self, basis: &Array2<f64>) -> Array2<f64> {
        let mut full = Array2::zeros((self.num_dofs, basis.ncols()));
        for (row, &dof) in self.free.iter().enumerate() {
            full.row_mut(dof).assign(&basis.row(row));
        }
        full
    }

    /// Prescribed values laid out in partition order
    ///
    /// `values` holds `(dof, value)` pairs; prescribed DOFs without an entry
    /// are held at zero.
    pub fn prescribed_vector(&self, values: &[(usize, Complex64)]) -> Array1<Complex64> {
        let mut vector = Array1::zeros(self.prescribed.len());
        for &(dof, value) in values {
            if let Ok(pos) = self.prescribed.binary_search(&dof) {
                vector[pos] = value;
            }
        }
        vector
    }

    /// `A_ff` of a square operator
    pub fn free_block<T: ComplexField>(&self, matrix: &CsrMatrix<T>) -> CsrMatrix<T> {
        matrix.extract(&self.free, &self.free)
    }

    /// Eliminate the prescribed DOFs of `A u = F`
    pub fn eliminate(
        &self,
        matrix: &CsrMatrix<Complex64>,
        rhs: &Array1<Complex64>,
        prescribed_values: &Array1<Complex64>,
    ) -> ReducedSystem {
        let mut reduced_rhs = self.restrict(rhs);
        if !self.prescribed.is_empty() {
            let coupling = matrix.extract(&self.free, &self.prescribed);
            reduced_rhs -= &coupling.matvec(prescribed_values);
        }
        ReducedSystem {
            matrix: self.free_block(matrix),
            rhs: reduced_rhs,
        }
    }
}
