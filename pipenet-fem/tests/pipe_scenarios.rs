//! End-to-end scenarios on small piping networks
//!
//! Each test builds a model through the public API and runs a full analysis,
//! checking the result against a closed-form value or a physical balance.

use approx::assert_relative_eq;
use fem::attachments::{BcValue, DECOUPLING_MASKS, DofValues, NO_DECOUPLING, RadiationKind};
use fem::criteria::Criterion;
use fem::elements::structural_matrices;
use fem::mesh::{Physics, RawEdge, RawNode};
use fem::properties::{AcousticKind, CrossSection, Fluid, Material, StructuralKind};
use fem::{AnalysisRequest, CancellationToken, PipeModel, SolverConfig, solve, solve_with_cancellation};
use std::collections::BTreeSet;
use std::f64::consts::PI;

const OUTER_DIAMETER: f64 = 0.1;
const THICKNESS: f64 = 0.005;

fn steel_pipe(model: &mut PipeModel) {
    model.mesh.update_all_properties(|p| {
        p.structural_kind = Some(StructuralKind::Pipe);
        p.material = Some(Material::steel());
        p.section = Some(CrossSection::pipe(OUTER_DIAMETER, THICKNESS));
    });
}

fn plane_wave(model: &mut PipeModel, fluid: Fluid) {
    model.mesh.update_all_properties(|p| {
        p.acoustic_kind = Some(AcousticKind::PlaneWave);
        p.fluid = Some(fluid.clone());
        p.section = Some(CrossSection::pipe(OUTER_DIAMETER, THICKNESS));
    });
}

/// `elements` equal elements along x, nodes 1..=elements+1
fn straight(length: f64, elements: usize) -> PipeModel {
    let nodes: Vec<RawNode> = (0..=elements)
        .map(|i| RawNode::new(i + 1, length * i as f64 / elements as f64, 0.0, 0.0))
        .collect();
    let edges: Vec<RawEdge> = (1..=elements).map(|i| RawEdge::new(i, i, i + 1)).collect();
    PipeModel::build(&nodes, &edges).unwrap()
}

/// Two legs meeting at a right angle at node 2
fn elbow() -> PipeModel {
    let nodes = [
        RawNode::new(1, 0.0, 0.0, 0.0),
        RawNode::new(2, 1.0, 0.0, 0.0),
        RawNode::new(3, 1.0, 1.0, 0.0),
    ];
    PipeModel::build(&nodes, &[RawEdge::new(1, 1, 2), RawEdge::new(2, 2, 3)]).unwrap()
}

fn max_norm(values: impl IntoIterator<Item = num_complex::Complex64>) -> f64 {
    values.into_iter().map(|v| v.norm()).fold(0.0, f64::max)
}

#[test]
fn test_global_indices_form_a_permutation() {
    // T-junction with scattered ids, edges listed out of order
    let nodes = [
        RawNode::new(70, 0.0, 0.0, 0.0),
        RawNode::new(3, 1.0, 0.0, 0.0),
        RawNode::new(512, 2.0, 0.0, 0.0),
        RawNode::new(41, 1.0, 1.0, 0.0),
        RawNode::new(8, 1.0, 2.0, 0.0),
    ];
    let edges = [
        RawEdge::new(9, 41, 8),
        RawEdge::new(2, 70, 3),
        RawEdge::new(5, 3, 512),
        RawEdge::new(1, 3, 41),
    ];
    let model = PipeModel::build(&nodes, &edges).unwrap();

    let indices: BTreeSet<usize> = model.mesh.nodes().iter().map(|n| n.global_index).collect();
    assert_eq!(indices, (0..nodes.len()).collect());
    for raw in &nodes {
        let index = model.mesh.global_index(raw.id).unwrap();
        assert_eq!(model.mesh.node_at(index).unwrap().id, raw.id);
    }
}

#[test]
fn test_masked_element_stiffness_stays_symmetric() {
    let mut model = straight(1.0, 1);
    steel_pipe(&mut model);
    let element = model.mesh.element(1).unwrap();

    for mask in DECOUPLING_MASKS.iter().flatten() {
        let mut matrices = structural_matrices(element).unwrap();
        matrices.apply_mask(mask);
        let k = &matrices.stiffness;
        for i in 0..12 {
            for j in 0..12 {
                assert_relative_eq!(k[[i, j]], k[[j, i]], epsilon = 1e-6, max_relative = 1e-12);
            }
        }
    }
}

#[test]
fn test_cantilever_axial_and_torsion_modes() {
    let length = 2.0;
    let mut model = straight(length, 1);
    steel_pipe(&mut model);
    model
        .attachments
        .set_prescribed_dofs(&model.mesh, 1, Some(DofValues::clamped()))
        .unwrap();

    let outcome = solve(&model, &AnalysisRequest::modal(Physics::Structural, 6, 0.0), &SolverConfig::default()).unwrap();
    let modal = outcome.as_modal().unwrap();
    assert_eq!(modal.num_modes(), 6);
    assert!(modal.issues.is_empty());

    // One element with consistent mass: λ = k/m = (EA/L) / (ρAL/3)
    let steel = Material::steel();
    let axial = 3.0 * steel.elastic_modulus / (steel.density * length * length);
    let torsion = 3.0 * steel.shear_modulus() / (steel.density * length * length);
    for expected in [axial, torsion] {
        assert!(
            modal
                .eigenvalues
                .iter()
                .any(|&lambda| (lambda - expected).abs() <= 1e-6 * expected),
            "no eigenvalue near {expected}: {:?}",
            modal.eigenvalues
        );
    }
    let clamped = modal.nodal_shape(&model.mesh, 1, 0).unwrap();
    assert!(clamped.iter().all(|&v| v == 0.0));
}

#[test]
fn test_cleared_prescription_leaves_no_trace() {
    let build = || {
        let mut model = straight(1.0, 4);
        steel_pipe(&mut model);
        model
            .attachments
            .set_prescribed_dofs(&model.mesh, 1, Some(DofValues::clamped()))
            .unwrap();
        model
            .attachments
            .set_nodal_loads(&model.mesh, 5, Some(DofValues::single(1, 100.0)))
            .unwrap();
        model
    };
    let reference = build();
    let mut cleared = build();
    cleared
        .attachments
        .set_prescribed_dofs(&cleared.mesh, 3, Some(DofValues::clamped()))
        .unwrap();
    cleared.attachments.set_prescribed_dofs(&cleared.mesh, 3, None).unwrap();
    assert_eq!(cleared.attachments.nodes_with_prescribed_dofs().collect::<Vec<_>>(), vec![1]);

    let request = AnalysisRequest::direct_harmonic(Physics::Structural, vec![5.0, 50.0]);
    let config = SolverConfig::default();
    let expected = solve(&reference, &request, &config).unwrap();
    let actual = solve(&cleared, &request, &config).unwrap();
    assert_eq!(
        actual.as_harmonic().unwrap().field,
        expected.as_harmonic().unwrap().field
    );
}

#[test]
fn test_fixed_unloaded_pipe_stays_at_rest() {
    let mut model = straight(5.0, 10);
    steel_pipe(&mut model);
    for node in [1, 11] {
        model
            .attachments
            .set_prescribed_dofs(&model.mesh, node, Some(DofValues::all(0.0)))
            .unwrap();
    }

    let request = AnalysisRequest::direct_harmonic(Physics::Structural, vec![0.0, 1.0, 37.5, 400.0])
        .with_damping([0.0, 0.01, 0.0, 0.0]);
    let outcome = solve(&model, &request, &SolverConfig::default()).unwrap();
    let solution = outcome.as_harmonic().unwrap();
    assert!(solution.is_complete());
    assert!(max_norm(solution.field.iter().copied()) < 1e-12);
}

#[test]
fn test_free_free_element_has_six_rigid_modes() {
    let mut model = straight(1.0, 1);
    steel_pipe(&mut model);

    let outcome = solve(&model, &AnalysisRequest::modal(Physics::Structural, 7, 0.0), &SolverConfig::default()).unwrap();
    let modal = outcome.as_modal().unwrap();
    assert_eq!(modal.num_modes(), 7);

    let flexible = modal.natural_frequencies[6];
    assert!(flexible > 10.0, "first flexible mode at {flexible} Hz");
    for &rigid in modal.natural_frequencies.iter().take(6) {
        assert!(rigid < 1e-3 * flexible, "rigid mode at {rigid} Hz");
    }
}

#[test]
fn test_decoupling_needs_a_real_junction() {
    let mut model = elbow();
    steel_pipe(&mut model);

    let mask = model
        .attachments
        .set_rotation_decoupling(&model.mesh, 1, 2, [true, true, false])
        .unwrap();
    assert_eq!(mask, &NO_DECOUPLING);
    assert_eq!(model.attachments.decouplings().count(), 0);
    assert_eq!(model.attachments.decoupled_elements().count(), 0);
    assert!(model.attachments.element_decoupling_mask(1).is_none());
}

#[test]
fn test_radiation_beyond_its_range_warns_once() {
    let mut model = straight(1.0, 5);
    plane_wave(&mut model, Fluid::air());
    model
        .attachments
        .set_volume_velocity(&model.mesh, 1, Some(BcValue::real(1e-3)))
        .unwrap();
    model
        .attachments
        .set_radiation_impedance(&model.mesh, 6, Some(RadiationKind::Unflanged))
        .unwrap();

    let radius = 0.5 * OUTER_DIAMETER - THICKNESS;
    let f_max = Fluid::air().speed_of_sound / (2.0 * PI * radius);
    let request = AnalysisRequest::direct_harmonic(Physics::Acoustic, vec![f_max + 1.0]);
    let outcome = solve(&model, &request, &SolverConfig::default()).unwrap();
    let solution = outcome.as_harmonic().unwrap();

    assert!(solution.is_complete());
    assert_eq!(solution.warnings.len(), 1);
    let warning = &solution.warnings[0];
    assert_eq!(warning.criterion, Criterion::RadiationImpedance);
    assert_eq!(warning.offending_ids, vec![5]);
    assert_relative_eq!(warning.valid_range.unwrap().max, f_max, max_relative = 1e-12);
}

#[test]
fn test_spring_and_clamp_balance_the_load() {
    let mut model = straight(1.0, 1);
    steel_pipe(&mut model);
    let attachments = &mut model.attachments;
    attachments
        .set_prescribed_dofs(&model.mesh, 1, Some(DofValues::clamped()))
        .unwrap();
    attachments
        .set_lumped_springs(&model.mesh, 2, Some(DofValues::all(1e8)))
        .unwrap();
    attachments
        .set_nodal_loads(&model.mesh, 2, Some(DofValues::new([Some(BcValue::real(1e4)), Some(BcValue::real(-2e3)), None, None, None, None])))
        .unwrap();

    let request = AnalysisRequest::direct_harmonic(Physics::Structural, vec![0.0]);
    let outcome = solve(&model, &request, &SolverConfig::default()).unwrap();
    let reactions = &outcome.as_harmonic().unwrap().reactions;

    let clamp = &reactions.prescribed[&1];
    let spring = &reactions.springs[&2];
    for (dof, load) in [(0, 1e4), (1, -2e3)] {
        let total = clamp[[0, dof]] + spring[[0, dof]];
        assert_relative_eq!(total.re, -load, max_relative = 1e-8);
        assert!(total.im.abs() < 1e-8 * load.abs());
    }
    assert!(reactions.dampers.is_empty());
}

#[test]
fn test_coupled_structure_follows_the_acoustic_source() {
    let run = |source: f64| {
        let mut model = elbow();
        steel_pipe(&mut model);
        plane_wave(&mut model, Fluid::water());
        for node in [1, 3] {
            model
                .attachments
                .set_prescribed_dofs(&model.mesh, node, Some(DofValues::clamped()))
                .unwrap();
        }
        model
            .attachments
            .set_volume_velocity(&model.mesh, 1, Some(BcValue::real(source)))
            .unwrap();
        model
            .attachments
            .set_radiation_impedance(&model.mesh, 3, Some(RadiationKind::Anechoic))
            .unwrap();
        solve(&model, &AnalysisRequest::coupled(vec![20.0, 80.0]), &SolverConfig::default()).unwrap()
    };

    let single = run(1e-4);
    let double = run(2e-4);
    let single = single.as_coupled().unwrap();
    let double = double.as_coupled().unwrap();
    assert!(single.acoustic.is_complete() && single.structural.is_complete());
    assert_eq!(single.acoustic.physics, Physics::Acoustic);
    assert_eq!(single.structural.physics, Physics::Structural);

    // The bend is the only place where the pressure pushes on the pipe
    let bend: f64 = max_norm(single.structural.field.iter().copied());
    assert!(bend > 0.0);
    for (a, b) in single.structural.field.iter().zip(double.structural.field.iter()) {
        assert_relative_eq!(b.re, 2.0 * a.re, epsilon = 1e-12 * bend, max_relative = 1e-8);
        assert_relative_eq!(b.im, 2.0 * a.im, epsilon = 1e-12 * bend, max_relative = 1e-8);
    }
}

#[test]
fn test_cancelled_sweep_keeps_its_shape() {
    let mut model = straight(1.0, 2);
    steel_pipe(&mut model);
    model
        .attachments
        .set_prescribed_dofs(&model.mesh, 1, Some(DofValues::clamped()))
        .unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let request = AnalysisRequest::direct_harmonic(Physics::Structural, vec![10.0, 20.0, 30.0]);
    let outcome = solve_with_cancellation(&model, &request, &SolverConfig::default(), &cancel).unwrap();
    let solution = outcome.as_harmonic().unwrap();
    assert!(solution.cancelled);
    assert_eq!(solution.field.dim(), (18, 3));
    assert!(solution.solved.iter().all(|&s| !s));
}

#[test]
fn test_request_loaded_from_json() {
    let mut model = straight(1.0, 2);
    plane_wave(&mut model, Fluid::air());
    model
        .attachments
        .set_volume_velocity(&model.mesh, 1, Some(BcValue::real(1e-3)))
        .unwrap();
    model
        .attachments
        .set_radiation_impedance(&model.mesh, 3, Some(RadiationKind::Anechoic))
        .unwrap();

    let request = AnalysisRequest::from_json_str(
        r#"{
            "kind": "direct_harmonic",
            "physics": "acoustic",
            "frequencies": { "frequency_min": 10.0, "frequency_max": 50.0, "frequency_step": 10.0 }
        }"#,
    )
    .unwrap();
    let outcome = solve(&model, &request, &SolverConfig::default()).unwrap();
    let solution = outcome.as_harmonic().unwrap();
    assert_eq!(solution.frequencies, vec![10.0, 20.0, 30.0, 40.0, 50.0]);
    assert!(solution.is_complete());
    assert!(solution.reactions.is_empty());
}
