//! Frequency-dependent operators of the two physical systems
//!
//! An operator owns everything that does not change over a sweep (base
//! matrices, DOF partition, frequency-independent lumps) and rebuilds the
//! rest per sample.

use crate::assembly::{
    DofPartition, LumpedMatrices, acoustic_prescribed_dofs, acoustic_prescribed_values, assemble_acoustic,
    assemble_acoustic_fe, assemble_lumped, assemble_structural, nodal_load_vector, prescribed_structural_values,
};
use crate::config::DampingCoefficients;
use crate::error::Result;
use crate::mesh::Physics;
use crate::model::PipeModel;
use ndarray::Array1;
use num_complex::Complex64;
use solvers::CsrMatrix;
use std::borrow::Cow;
use std::f64::consts::PI;

/// Dynamic system of one physics, evaluated sample by sample
pub trait HarmonicOperator: Sync {
    fn physics(&self) -> Physics;

    fn partition(&self) -> &DofPartition;

    /// Dynamic matrix `A(ω)` and load `F(ω)` over all DOFs
    fn system(&self, frequency: f64) -> Result<(CsrMatrix<Complex64>, Array1<Complex64>)>;

    /// `(dof, value)` pairs of the prescribed DOFs
    fn prescribed_values(&self, frequency: f64) -> Result<Vec<(usize, Complex64)>>;

    /// Real stiffness and mass of the undamped eigenproblem
    fn modal_matrices(&self) -> Result<(CsrMatrix<f64>, CsrMatrix<f64>)>;

    fn num_dofs(&self) -> usize {
        self.partition().num_dofs()
    }
}

/// Structural dynamic stiffness
/// `(1 + i(β_h + ωβ_v)) K + (−ω² + i(α_h + ωα_v)) M + K_lump − ω² M_lump + iω C_lump`
pub struct StructuralOperator<'a> {
    model: &'a PipeModel,
    stiffness: CsrMatrix<f64>,
    mass: CsrMatrix<f64>,
    complex_stiffness: CsrMatrix<Complex64>,
    complex_mass: CsrMatrix<Complex64>,
    /// Lumps shared by every sample when none of them is tabulated
    lumped: Option<LumpedMatrices>,
    partition: DofPartition,
    damping: DampingCoefficients,
}

impl<'a> StructuralOperator<'a> {
    pub fn new(model: &'a PipeModel, damping: DampingCoefficients) -> Result<Self> {
        let matrices = assemble_structural(&model.mesh, &model.attachments)?;
        let lumped = if model.attachments.has_frequency_dependent_lumps() {
            None
        } else {
            Some(assemble_lumped(&model.mesh, &model.attachments, 0.0)?)
        };
        let prescribed = model.attachments.prescribed_structural_dofs(&model.mesh)?;
        let partition = DofPartition::new(matrices.num_dofs, prescribed);
        log::info!(
            "structural operator: {} DOFs, {} free",
            partition.num_dofs(),
            partition.num_free()
        );
        Ok(Self {
            model,
            complex_stiffness: matrices.stiffness.map(|v| Complex64::new(v, 0.0)),
            complex_mass: matrices.mass.map(|v| Complex64::new(v, 0.0)),
            stiffness: matrices.stiffness,
            mass: matrices.mass,
            lumped,
            partition,
            damping,
        })
    }

    /// Lumped matrices at `frequency`
    pub fn lumped(&self, frequency: f64) -> Result<Cow<'_, LumpedMatrices>> {
        match &self.lumped {
            Some(lumped) => Ok(Cow::Borrowed(lumped)),
            None => Ok(Cow::Owned(assemble_lumped(
                &self.model.mesh,
                &self.model.attachments,
                frequency,
            )?)),
        }
    }
}

impl HarmonicOperator for StructuralOperator<'_> {
    fn physics(&self) -> Physics {
        Physics::Structural
    }

    fn partition(&self) -> &DofPartition {
        &self.partition
    }

    fn system(&self, frequency: f64) -> Result<(CsrMatrix<Complex64>, Array1<Complex64>)> {
        let omega = 2.0 * PI * frequency;
        let omega2 = omega * omega;
        let lumped = self.lumped(frequency)?;
        let matrix = CsrMatrix::linear_combination(&[
            (
                Complex64::new(1.0, self.damping.stiffness_factor(omega)),
                &self.complex_stiffness,
            ),
            (
                Complex64::new(-omega2, self.damping.mass_factor(omega)),
                &self.complex_mass,
            ),
            (Complex64::new(1.0, 0.0), &lumped.stiffness),
            (Complex64::new(-omega2, 0.0), &lumped.mass),
            (Complex64::new(0.0, omega), &lumped.damping),
        ]);
        let load = nodal_load_vector(&self.model.mesh, &self.model.attachments, frequency)?;
        Ok((matrix, load))
    }

    fn prescribed_values(&self, frequency: f64) -> Result<Vec<(usize, Complex64)>> {
        prescribed_structural_values(&self.model.mesh, &self.model.attachments, frequency)
    }

    /// `K + Re K_lump(0)` and `M + Re M_lump(0)`
    fn modal_matrices(&self) -> Result<(CsrMatrix<f64>, CsrMatrix<f64>)> {
        let (k_lump, m_lump) = self.lumped(0.0)?.real_parts();
        Ok((
            CsrMatrix::linear_combination(&[(1.0, &self.stiffness), (1.0, &k_lump)]),
            CsrMatrix::linear_combination(&[(1.0, &self.mass), (1.0, &m_lump)]),
        ))
    }
}

/// Acoustic dynamic stiffness of the duct network
pub struct AcousticOperator<'a> {
    model: &'a PipeModel,
    partition: DofPartition,
    /// Hysteretic loss of plane-wave elements
    loss_factor: f64,
}

impl<'a> AcousticOperator<'a> {
    pub fn new(model: &'a PipeModel, damping: DampingCoefficients) -> Result<Self> {
        let prescribed = acoustic_prescribed_dofs(&model.mesh, &model.attachments)?;
        let partition = DofPartition::new(model.mesh.num_dofs(Physics::Acoustic), prescribed);
        log::info!(
            "acoustic operator: {} DOFs, {} free",
            partition.num_dofs(),
            partition.num_free()
        );
        Ok(Self {
            model,
            partition,
            loss_factor: damping.beta_h,
        })
    }
}

impl HarmonicOperator for AcousticOperator<'_> {
    fn physics(&self) -> Physics {
        Physics::Acoustic
    }

    fn partition(&self) -> &DofPartition {
        &self.partition
    }

    fn system(&self, frequency: f64) -> Result<(CsrMatrix<Complex64>, Array1<Complex64>)> {
        let system = assemble_acoustic(&self.model.mesh, &self.model.attachments, frequency, self.loss_factor)?;
        Ok((system.matrix, system.rhs))
    }

    fn prescribed_values(&self, frequency: f64) -> Result<Vec<(usize, Complex64)>> {
        acoustic_prescribed_values(&self.model.mesh, &self.model.attachments, frequency)
    }

    /// FE stiffness and mass; terminations are left out
    fn modal_matrices(&self) -> Result<(CsrMatrix<f64>, CsrMatrix<f64>)> {
        let fe = assemble_acoustic_fe(&self.model.mesh)?;
        Ok((fe.stiffness, fe.mass))
    }
}

/// Operator of `physics` on `model`
pub fn harmonic_operator<'a>(
    model: &'a PipeModel,
    physics: Physics,
    damping: DampingCoefficients,
) -> Result<Box<dyn HarmonicOperator + 'a>> {
    Ok(match physics {
        Physics::Structural => Box::new(StructuralOperator::new(model, damping)?),
        Physics::Acoustic => Box::new(AcousticOperator::new(model, damping)?),
    })
}
