//! Resistive circuit scenarios: dividers, Ohm's law, stamp additivity.

use approx::assert_abs_diff_eq;
use voltaic_core::components::{Capacitor, Component, Inductor, Resistor, VoltageSource};
use voltaic_core::{Circuit, NodeId, Simulator};

fn divider(v: f64, r_top: f64, r_bottom: f64) -> (Simulator, NodeId, NodeId) {
    let mut circuit = Circuit::new();
    let gnd = circuit.create_node();
    let n1 = circuit.create_node();
    let n2 = circuit.create_node();
    circuit.add_component(VoltageSource::dc(v), n1, gnd).unwrap();
    circuit.add_component(Resistor::new(r_top), n1, n2).unwrap();
    circuit.add_component(Resistor::new(r_bottom), n2, gnd).unwrap();
    (Simulator::new(circuit), n1, n2)
}

#[test]
fn test_equal_divider() {
    let (mut sim, n1, n2) = divider(10.0, 1000.0, 1000.0);
    sim.step(1e-6).unwrap();
    assert_abs_diff_eq!(sim.node_voltage(n1), 10.0, epsilon = 1e-3);
    assert_abs_diff_eq!(sim.node_voltage(n2), 5.0, epsilon = 1e-3);
}

#[test]
fn test_unequal_divider() {
    let (mut sim, _, n2) = divider(5.0, 2000.0, 3000.0);
    sim.step(1e-6).unwrap();
    assert_abs_diff_eq!(sim.node_voltage(n2), 3.0, epsilon = 1e-3);
}

#[test]
fn test_series_currents() {
    let (mut sim, _, _) = divider(10.0, 500.0, 500.0);
    sim.step(1e-6).unwrap();
    let circuit = sim.circuit();
    let currents: Vec<f64> = (1..3)
        .map(|i| circuit.component_current(voltaic_core::ComponentId(i)))
        .collect();
    assert_abs_diff_eq!(currents[0], 0.01, epsilon = 1e-9);
    assert_abs_diff_eq!(currents[1], 0.01, epsilon = 1e-9);
}

#[test]
fn test_shorted_source_is_singular() {
    let mut circuit = Circuit::new();
    let gnd = circuit.create_node();
    let n1 = circuit.create_node();
    circuit.add_component(VoltageSource::dc(5.0), n1, gnd).unwrap();
    circuit.add_component(Resistor::new(1000.0), n1, gnd).unwrap();
    // Both terminals on ground: its branch row stays empty.
    circuit.add_component(VoltageSource::dc(1.0), gnd, gnd).unwrap();

    let mut sim = Simulator::new(circuit);
    let err = sim.step(1e-6).unwrap_err();
    assert!(err.is_configuration_error());
    assert_eq!(sim.time(), 0.0);
    assert_eq!(sim.node_voltage(n1), 0.0);
}

#[test]
fn test_parallel_resistors() {
    let mut circuit = Circuit::new();
    let gnd = circuit.create_node();
    let n1 = circuit.create_node();
    circuit.add_component(VoltageSource::dc(5.0), n1, gnd).unwrap();
    let r1 = circuit.add_component(Resistor::new(1000.0), n1, gnd).unwrap();
    let r2 = circuit.add_component(Resistor::new(1000.0), n1, gnd).unwrap();
    let mut sim = Simulator::new(circuit);
    sim.step(1e-6).unwrap();

    assert_abs_diff_eq!(sim.circuit().component_current(r1), 0.005, epsilon = 1e-9);
    assert_abs_diff_eq!(sim.circuit().component_current(r2), 0.005, epsilon = 1e-9);
    let src = sim.circuit().components()[0].as_voltage_source().unwrap();
    assert_abs_diff_eq!(src.current(), 0.01, epsilon = 1e-9);
}

#[test]
fn test_ohms_law_holds_for_every_resistor() {
    let mut circuit = Circuit::new();
    let [gnd, n1, n2, n3]: [NodeId; 4] = circuit.create_nodes(4).try_into().unwrap();
    circuit.add_component(VoltageSource::ac(12.0, 60.0, 0.3).unwrap(), n1, gnd).unwrap();
    circuit.add_component(Resistor::new(220.0), n1, n2).unwrap();
    circuit.add_component(Resistor::new(470.0), n2, n3).unwrap();
    circuit.add_component(Resistor::new(1000.0), n3, gnd).unwrap();
    circuit.add_component(Capacitor::new(1e-6), n2, gnd).unwrap();
    circuit.add_component(Inductor::new(1e-2), n3, gnd).unwrap();
    let mut sim = Simulator::new(circuit);

    for _ in 0..50 {
        sim.step(1e-4).unwrap();
        let circuit = sim.circuit();
        for (i, component) in circuit.components().iter().enumerate() {
            let Some(r) = component.as_resistor() else {
                continue;
            };
            let [a, b] = r.nodes.unwrap();
            let expected = (circuit.node_voltage(a) - circuit.node_voltage(b)) / r.resistance();
            assert_abs_diff_eq!(
                circuit.component_current(voltaic_core::ComponentId(i)),
                expected,
                epsilon = 1e-12
            );
        }
    }
}

/// Every ordering of `items`.
fn permutations(items: &[usize]) -> Vec<Vec<usize>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for (i, &first) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, first);
            out.push(tail);
        }
    }
    out
}

#[test]
fn test_registration_order_does_not_change_solution() {
    let build = |order: &[usize]| {
        let mut circuit = Circuit::new();
        let [gnd, n1, n2, n3]: [NodeId; 4] = circuit.create_nodes(4).try_into().unwrap();
        let parts: Vec<(Component, NodeId, NodeId)> = vec![
            (VoltageSource::dc(10.0).into(), n1, gnd),
            (Resistor::new(1000.0).into(), n1, n2),
            (Resistor::new(2000.0).into(), n2, gnd),
            (Capacitor::new(1e-6).into(), n2, gnd),
            (Resistor::new(500.0).into(), n2, n3),
            (Inductor::new(1e-3).into(), n3, gnd),
        ];
        let mut parts: Vec<Option<_>> = parts.into_iter().map(Some).collect();
        for &i in order {
            let (component, a, b) = parts[i].take().unwrap();
            circuit.add_component(component, a, b).unwrap();
        }
        let mut sim = Simulator::new(circuit);
        for _ in 0..5 {
            sim.step(1e-5).unwrap();
        }
        [n1, n2, n3].map(|n| sim.node_voltage(n))
    };

    let baseline = build(&[0, 1, 2, 3, 4, 5]);
    for order in permutations(&[0, 1, 2, 3, 4, 5]) {
        let voltages = build(&order);
        for (v, expected) in voltages.iter().zip(&baseline) {
            assert_abs_diff_eq!(*v, *expected, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_two_sources_in_series() {
    let mut circuit = Circuit::new();
    let [gnd, n1, n2]: [NodeId; 3] = circuit.create_nodes(3).try_into().unwrap();
    circuit.add_component(VoltageSource::dc(3.0), n1, gnd).unwrap();
    circuit.add_component(VoltageSource::dc(2.0), n2, n1).unwrap();
    circuit.add_component(Resistor::new(100.0), n2, gnd).unwrap();
    let mut sim = Simulator::new(circuit);
    sim.step(1e-3).unwrap();

    assert_abs_diff_eq!(sim.node_voltage(n1), 3.0, epsilon = 1e-9);
    assert_abs_diff_eq!(sim.node_voltage(n2), 5.0, epsilon = 1e-9);
    for source in sim.circuit().components().iter().filter_map(Component::as_voltage_source) {
        assert_abs_diff_eq!(source.current(), 0.05, epsilon = 1e-9);
    }
}

#[test]
fn test_nodes_in_registration_order() {
    let (mut sim, n1, n2) = divider(1.0, 1.0, 1.0);
    sim.step(1e-3).unwrap();
    let ids: Vec<NodeId> = sim.nodes().map(|n| n.id).collect();
    assert_eq!(ids, vec![n1, NodeId::GROUND, n2]);
    assert!(sim.nodes().find(|n| n.is_ground()).unwrap().voltage == 0.0);
}

#[test]
fn test_shunt_beside_teraohm_divider() {
    let mut circuit = Circuit::new();
    let [gnd, n1, n2]: [NodeId; 3] = circuit.create_nodes(3).try_into().unwrap();
    circuit.add_component(VoltageSource::dc(1.0), n1, gnd).unwrap();
    let shunt = circuit.add_component(Resistor::new(1e-3), n1, gnd).unwrap();
    circuit.add_component(Resistor::new(1e12), n1, n2).unwrap();
    circuit.add_component(Resistor::new(1e12), n2, gnd).unwrap();
    let mut sim = Simulator::new(circuit);
    sim.step(1e-3).unwrap();

    assert_abs_diff_eq!(sim.node_voltage(n1), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(sim.node_voltage(n2), 0.5, epsilon = 1e-9);
    assert_abs_diff_eq!(sim.circuit().component_current(shunt), 1e3, epsilon = 1e-6);
}
