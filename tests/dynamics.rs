use spikenet::stimulus::StimulusSource;
use spikenet::{
    Network, NetworkConfig, NodeId, NodeState, NoiseStimulus, Polarity, Prng, ScriptedSource,
};

fn assert_states_valid(net: &Network) {
    for n in net.nodes() {
        if n.state() == NodeState::Refractory {
            assert!(matches!(n.wait_count(), 1 | 2), "node {} wait {}", n.id(), n.wait_count());
        } else {
            assert_eq!(n.wait_count(), 0);
        }
        assert!(n.total_input().is_finite());
    }
    assert_eq!(net.node_count(), net.layer_widths().iter().sum::<usize>());
}

#[test]
fn scripted_full_network_fires_when_threshold_allows() {
    // Every draw is 0.95: all nodes excitatory, every link active.
    let cfg = NetworkConfig {
        threshold: 1.5,
        inhibitory_ratio: 0.0,
        ..NetworkConfig::full()
    };
    let rng = Box::new(ScriptedSource::new(vec![0.95]));
    let mut net = Network::with_rng(&[2, 3, 1], cfg, rng).unwrap();
    assert!(net.links().iter().all(|l| l.is_active()));

    let stable = net.forward_step(&[1.0, 1.0]).unwrap();
    let inputs: Vec<f64> = net.layer(0).map(|n| n.output()).collect();
    assert_eq!(inputs, vec![1.0, 1.0]);

    // h1 = 2, h2 = 2 + h1 = 4, h3 = 2 + h1 + h2 = 8, out = 2 + 4 + 8 = 14.
    assert!(!stable);
    let hidden: Vec<f64> = net.layer(1).map(|n| n.output()).collect();
    assert_eq!(hidden, vec![2.0, 4.0, 8.0]);
    assert_eq!(net.layer(2).map(|n| n.output()).collect::<Vec<_>>(), vec![14.0]);
}

#[test]
fn scripted_full_network_stays_quiet_below_threshold() {
    let cfg = NetworkConfig {
        inhibitory_ratio: 0.0,
        ..NetworkConfig::full()
    };
    let rng = Box::new(ScriptedSource::new(vec![0.95]));
    let mut net = Network::with_rng(&[2, 3, 1], cfg, rng).unwrap();

    // Each hidden node sees 2.0 < 4.0 and nobody upstream fired.
    assert!(net.forward_step(&[1.0, 1.0]).unwrap());
    let charge: Vec<f64> = net.layer(1).map(|n| n.total_input()).collect();
    assert_eq!(charge, vec![2.0, 2.0, 2.0]);
    assert_eq!(net.read_output(), vec![0.0]);
}

#[test]
fn seeded_full_network_is_stable_under_unit_input() {
    let cfg = NetworkConfig {
        seed: Some(2024),
        ..NetworkConfig::full()
    };
    let mut net = Network::with_config(&[2, 3, 1], cfg).unwrap();
    // Two unit inputs can never exceed the default threshold of 4.0 on the
    // first sweep, whatever the weights turned out to be.
    assert!(net.forward_step(&[1.0, 1.0]).unwrap());
    let inputs: Vec<f64> = net.layer(0).map(|n| n.output()).collect();
    assert_eq!(inputs, vec![1.0, 1.0]);
}

#[test]
fn single_chain_settles_after_one_quiet_sweep() {
    let cfg = NetworkConfig {
        threshold: 0.1,
        inhibitory_ratio: 0.0,
        ..NetworkConfig::bare(1)
    };
    let mut net = Network::with_config(&[1, 1, 1], cfg).unwrap();
    assert!(net.connect(NodeId(1), NodeId(2), 1.0).unwrap().is_active());

    assert!(!net.forward_step(&[1.0]).unwrap());
    assert_eq!(net.get_node(NodeId(2)).unwrap().state(), NodeState::Spiking);

    let out = net.stabilize_all();
    assert_eq!(out, vec![0.0]);
    assert_eq!(net.avalanche_count_history(), &[1]);
    assert_eq!(net.avalanche_size_history(), &[0]);
    assert_eq!(net.get_node(NodeId(2)).unwrap().state(), NodeState::Refractory);
}

#[test]
fn stabilize_all_size_equals_sum_of_steps() {
    let make = || {
        let cfg = NetworkConfig {
            threshold: 1.0,
            seed: Some(5),
            ..NetworkConfig::full()
        };
        Network::with_config(&[3, 6, 2], cfg).unwrap()
    };
    let mut stepped = make();
    let mut settled = make();
    let inputs = [3.0, 3.0, 3.0];

    let stable_a = stepped.forward_step(&inputs).unwrap();
    let stable_b = settled.forward_step(&inputs).unwrap();
    assert_eq!(stable_a, stable_b);

    let mut sweeps = 0;
    let mut size = 0;
    loop {
        sweeps += 1;
        let fired = stepped.stabilize_step();
        size += fired as usize;
        if fired == 0 || sweeps == 10_000 {
            break;
        }
    }
    if sweeps == 10_000 {
        // Self-sustaining for this seed; nothing to compare.
        return;
    }

    let out = settled.stabilize_all();
    let a = settled.last_avalanche().unwrap();
    assert_eq!((a.sweeps, a.size, a.truncated), (sweeps, size, false));
    assert_eq!(out, stepped.read_output());
}

#[test]
fn invariants_hold_over_a_noisy_run() {
    for seed in [1u64, 2, 3] {
        let cfg = NetworkConfig {
            threshold: 0.6,
            seed: Some(seed),
            ..NetworkConfig::growable(4, false)
        };
        let mut net = Network::with_config(&[5, 20, 3], cfg).unwrap();
        let mut feed = NoiseStimulus::new(5, 0.0, 1.5, seed);

        for tick in 0..60 {
            let inputs = feed.next_data();
            net.forward_step(&inputs).unwrap();
            assert_states_valid(&net);
            for _ in 0..50 {
                let fired = net.stabilize_step();
                assert_states_valid(&net);
                if fired == 0 {
                    break;
                }
            }
            if tick % 4 == 0 {
                net.grow_step();
                assert_states_valid(&net);
            }
        }
    }
}

#[test]
fn same_seed_same_topology_and_outputs() {
    let make = || {
        let cfg = NetworkConfig {
            threshold: 0.8,
            seed: Some(99),
            sweep_cap: Some(1_000),
            ..NetworkConfig::growable(2, true)
        };
        Network::with_config(&[4, 10, 3], cfg).unwrap()
    };
    let mut a = make();
    let mut b = make();

    assert_eq!(a.link_count(), b.link_count());
    for (la, lb) in a.links().iter().zip(b.links()) {
        assert_eq!(la.id(), lb.id());
        assert_eq!(la.weight().to_bits(), lb.weight().to_bits());
        assert_eq!(la.is_active(), lb.is_active());
    }
    for (na, nb) in a.nodes().iter().zip(b.nodes()) {
        assert_eq!(na.polarity(), nb.polarity());
    }

    let mut feed = NoiseStimulus::new(4, 0.0, 2.0, 3);
    for _ in 0..40 {
        let inputs = feed.next_data();
        let oa = a.forward_input_maybe_stabilize(&inputs).unwrap();
        let ob = b.forward_input_maybe_stabilize(&inputs).unwrap();
        assert_eq!(oa, ob);
    }
    assert_eq!(a.avalanche_size_history(), b.avalanche_size_history());
}

#[test]
fn injected_source_drives_construction() {
    let cfg = NetworkConfig::full();
    let a = Network::with_rng(&[3, 3, 2], cfg.clone(), Box::new(Prng::new(8))).unwrap();
    let b = Network::with_config(&[3, 3, 2], NetworkConfig { seed: Some(8), ..cfg }).unwrap();
    let wa: Vec<u64> = a.links().iter().map(|l| l.weight().to_bits()).collect();
    let wb: Vec<u64> = b.links().iter().map(|l| l.weight().to_bits()).collect();
    assert_eq!(wa, wb);
}

#[test]
fn inhibitory_spike_leaves_negative_output_charge() {
    // Polarity draws for in, h1, h2, out: only h1 lands above 1 - ratio.
    let cfg = NetworkConfig {
        threshold: 1.0,
        ..NetworkConfig::bare(2)
    };
    let rng = Box::new(ScriptedSource::new(vec![0.1, 0.95, 0.1, 0.1]));
    let mut net = Network::with_rng(&[1, 2, 1], cfg, rng).unwrap();
    assert_eq!(net.get_node(NodeId(2)).map(|n| n.polarity()), Some(Polarity::Inhibitory));
    net.connect(NodeId(1), NodeId(2), 1.0).unwrap();
    net.connect(NodeId(2), NodeId(4), 1.0).unwrap();

    // A negative spike does not count as a firing.
    assert!(net.forward_step(&[3.0]).unwrap());
    assert_eq!(net.get_node(NodeId(2)).map(|n| n.output()), Some(-3.0));
    assert_eq!(net.read_output(), vec![-3.0]);
    assert_states_valid(&net);
}
