//! Acoustic nodal attachments: sources and terminations
//!
//! A node holds at most one source (pressure or volume velocity) and at most
//! one termination (specific or radiation impedance). A prescribed pressure
//! excludes both a volume velocity and a termination on the same node, so
//! setting one clears the other.

use super::{Attachments, BcValue};
use crate::error::{ConfigError, Result};
use crate::mesh::Mesh;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Excitation applied at an acoustic node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcousticSource {
    /// Prescribed pressure (Pa)
    Pressure(BcValue),
    /// Injected volume velocity (m³/s)
    VolumeVelocity(BcValue),
}

/// Radiation condition of an open pipe end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiationKind {
    /// Non-reflecting end, z = 1
    Anechoic,
    /// Open end without flange
    Unflanged,
    /// Open end in an infinite baffle
    Flanged,
}

impl RadiationKind {
    /// Impedance normalized by ρc for a duct of radius `a` at wavenumber `k`
    pub fn normalized_impedance(&self, ka: f64) -> Complex64 {
        match self {
            RadiationKind::Anechoic => Complex64::new(1.0, 0.0),
            RadiationKind::Unflanged => Complex64::new(0.25 * ka * ka, 0.6133 * ka),
            RadiationKind::Flanged => Complex64::new(0.5 * ka * ka, 8.0 / (3.0 * PI) * ka),
        }
    }

    /// Upper `ka` bound of the low-frequency expansion, if any
    pub fn max_ka(&self) -> Option<f64> {
        match self {
            RadiationKind::Anechoic => None,
            RadiationKind::Unflanged | RadiationKind::Flanged => Some(1.0),
        }
    }
}

/// Impedance condition closing an acoustic node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcousticTermination {
    /// Specific acoustic impedance (Pa·s/m)
    SpecificImpedance(BcValue),
    /// Radiation into free field
    Radiation(RadiationKind),
}

impl AcousticTermination {
    /// Specific impedance (Pa·s/m) at `frequency` and Helmholtz number `ka`
    pub fn specific_impedance(&self, frequency: f64, fluid_impedance: f64, ka: f64) -> Complex64 {
        match self {
            AcousticTermination::SpecificImpedance(value) => value.evaluate(frequency),
            AcousticTermination::Radiation(kind) => kind.normalized_impedance(ka) * fluid_impedance,
        }
    }
}

impl Attachments {
    /// Prescribe (or clear) the pressure of a node
    pub fn set_acoustic_pressure(&mut self, mesh: &Mesh, node_id: usize, value: Option<BcValue>) -> Result<()> {
        mesh.node(node_id)?;
        match value {
            Some(value) => {
                value.validate()?;
                self.terminations.remove(&node_id);
                self.acoustic_sources
                    .insert(node_id, AcousticSource::Pressure(value));
            }
            None => {
                if matches!(self.acoustic_sources.get(&node_id), Some(AcousticSource::Pressure(_))) {
                    self.acoustic_sources.remove(&node_id);
                }
            }
        }
        Ok(())
    }

    /// Inject (or clear) a volume velocity at a node
    pub fn set_volume_velocity(&mut self, mesh: &Mesh, node_id: usize, value: Option<BcValue>) -> Result<()> {
        mesh.node(node_id)?;
        match value {
            Some(value) => {
                value.validate()?;
                self.acoustic_sources
                    .insert(node_id, AcousticSource::VolumeVelocity(value));
            }
            None => {
                if matches!(
                    self.acoustic_sources.get(&node_id),
                    Some(AcousticSource::VolumeVelocity(_))
                ) {
                    self.acoustic_sources.remove(&node_id);
                }
            }
        }
        Ok(())
    }

    fn set_termination(&mut self, node_id: usize, termination: Option<AcousticTermination>) {
        match termination {
            Some(termination) => {
                if matches!(self.acoustic_sources.get(&node_id), Some(AcousticSource::Pressure(_))) {
                    self.acoustic_sources.remove(&node_id);
                }
                self.terminations.insert(node_id, termination);
            }
            None => {
                self.terminations.remove(&node_id);
            }
        }
    }

    /// Set (or clear) a specific impedance termination
    ///
    /// The termination admittance is `1/Z`, so a zero impedance (or a table
    /// holding one) is rejected.
    pub fn set_specific_impedance(&mut self, mesh: &Mesh, node_id: usize, value: Option<BcValue>) -> Result<()> {
        mesh.node(node_id)?;
        if let Some(value) = &value {
            value.validate()?;
            let has_zero = match value {
                BcValue::Scalar(z) => z.norm() == 0.0,
                BcValue::Table { values, .. } => values.iter().any(|z| z.norm() == 0.0),
            };
            if has_zero {
                return Err(ConfigError::InvalidValue {
                    what: format!("specific impedance at node {node_id}"),
                    reason: "impedance must be non-zero".into(),
                });
            }
        }
        self.set_termination(node_id, value.map(AcousticTermination::SpecificImpedance));
        Ok(())
    }

    /// Set (or clear) a radiation impedance termination
    pub fn set_radiation_impedance(
        &mut self,
        mesh: &Mesh,
        node_id: usize,
        kind: Option<RadiationKind>,
    ) -> Result<()> {
        mesh.node(node_id)?;
        self.set_termination(node_id, kind.map(AcousticTermination::Radiation));
        Ok(())
    }

    pub fn acoustic_source(&self, node_id: usize) -> Option<&AcousticSource> {
        self.acoustic_sources.get(&node_id)
    }

    pub fn termination(&self, node_id: usize) -> Option<&AcousticTermination> {
        self.terminations.get(&node_id)
    }

    /// Prescribed pressures, ordered by node id
    pub fn acoustic_pressures(&self) -> impl Iterator<Item = (usize, &BcValue)> {
        self.acoustic_sources.iter().filter_map(|(&id, s)| match s {
            AcousticSource::Pressure(v) => Some((id, v)),
            AcousticSource::VolumeVelocity(_) => None,
        })
    }

    /// Volume velocities, ordered by node id
    pub fn volume_velocities(&self) -> impl Iterator<Item = (usize, &BcValue)> {
        self.acoustic_sources.iter().filter_map(|(&id, s)| match s {
            AcousticSource::VolumeVelocity(v) => Some((id, v)),
            AcousticSource::Pressure(_) => None,
        })
    }

    /// Terminations, ordered by node id
    pub fn terminations(&self) -> impl Iterator<Item = (usize, &AcousticTermination)> {
        self.terminations.iter().map(|(&id, t)| (id, t))
    }

    pub fn nodes_with_acoustic_pressure(&self) -> impl Iterator<Item = usize> + '_ {
        self.acoustic_pressures().map(|(id, _)| id)
    }

    pub fn nodes_with_volume_velocity(&self) -> impl Iterator<Item = usize> + '_ {
        self.volume_velocities().map(|(id, _)| id)
    }

    pub fn nodes_with_terminations(&self) -> impl Iterator<Item = usize> + '_ {
        self.terminations.keys().copied()
    }

    /// Whether any acoustic attachment is tabulated over frequency
    pub fn has_acoustic_tables(&self) -> bool {
        self.acoustic_sources.values().any(|s| match s {
            AcousticSource::Pressure(v) | AcousticSource::VolumeVelocity(v) => v.is_table(),
        }) || self.terminations.values().any(|t| {
            matches!(t, AcousticTermination::SpecificImpedance(v) if v.is_table())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{RawEdge, RawNode};
    use approx::assert_relative_eq;

    fn line() -> Mesh {
        let nodes = [RawNode::new(1, 0.0, 0.0, 0.0), RawNode::new(2, 1.0, 0.0, 0.0)];
        Mesh::build(&nodes, &[RawEdge::new(1, 1, 2)]).unwrap()
    }

    #[test]
    fn test_pressure_clears_volume_velocity_and_termination() {
        let mesh = line();
        let mut attachments = Attachments::new();
        attachments.set_volume_velocity(&mesh, 1, Some(BcValue::real(1e-3))).unwrap();
        attachments
            .set_radiation_impedance(&mesh, 1, Some(RadiationKind::Flanged))
            .unwrap();
        attachments.set_acoustic_pressure(&mesh, 1, Some(BcValue::real(1.0))).unwrap();

        assert_eq!(attachments.nodes_with_volume_velocity().count(), 0);
        assert_eq!(attachments.nodes_with_terminations().count(), 0);
        assert_eq!(attachments.nodes_with_acoustic_pressure().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_termination_clears_pressure() {
        let mesh = line();
        let mut attachments = Attachments::new();
        attachments.set_acoustic_pressure(&mesh, 2, Some(BcValue::real(1.0))).unwrap();
        attachments
            .set_specific_impedance(&mesh, 2, Some(BcValue::real(415.0)))
            .unwrap();
        assert!(attachments.acoustic_source(2).is_none());
        assert!(attachments.termination(2).is_some());

        // clearing a volume velocity leaves an unrelated pressure alone
        attachments.set_acoustic_pressure(&mesh, 1, Some(BcValue::real(1.0))).unwrap();
        attachments.set_volume_velocity(&mesh, 1, None).unwrap();
        assert_eq!(attachments.nodes_with_acoustic_pressure().count(), 1);
    }

    #[test]
    fn test_zero_specific_impedance_is_rejected() {
        let mesh = line();
        let mut attachments = Attachments::new();

        let err = attachments
            .set_specific_impedance(&mesh, 2, Some(BcValue::real(0.0)))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let table = BcValue::table(
            vec![0.0, 100.0],
            vec![Complex64::new(415.0, 0.0), Complex64::new(0.0, 0.0)],
        )
        .unwrap();
        assert!(attachments.set_specific_impedance(&mesh, 2, Some(table)).is_err());
        assert!(attachments.termination(2).is_none());

        attachments
            .set_specific_impedance(&mesh, 2, Some(BcValue::complex(0.0, 415.0)))
            .unwrap();
        assert!(attachments.termination(2).is_some());
    }

    #[test]
    fn test_radiation_impedance_limits() {
        assert_eq!(
            RadiationKind::Anechoic.normalized_impedance(0.3),
            Complex64::new(1.0, 0.0)
        );
        let z = RadiationKind::Unflanged.normalized_impedance(0.5);
        assert_relative_eq!(z.re, 0.0625);
        assert_relative_eq!(z.im, 0.30665, epsilon = 1e-12);
        let z = RadiationKind::Flanged.normalized_impedance(0.1);
        assert_relative_eq!(z.re, 0.005);
        assert_relative_eq!(z.im, 0.8 / (3.0 * PI), epsilon = 1e-15);
        assert_eq!(RadiationKind::Anechoic.max_ka(), None);
    }
}
