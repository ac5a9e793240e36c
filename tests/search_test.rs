use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use specfit::error::{SearchError, SpectralError};
use specfit::graph::Graph;
use specfit::model_selection::erdos_renyi;
use specfit::search::GraphModel;

#[test]
fn test_invalid_search_window() {
    let mut rng = ChaCha20Rng::seed_from_u64(31);
    let target = erdos_renyi(10, 0.5, &mut rng);
    let model = GraphModel::new(10, 1, 0.4);

    let err = model
        .populate_edges_spectrum(10, 10, 5, &target, &mut rng)
        .unwrap_err();
    assert_eq!(
        err,
        SearchError::InvalidSearchWindow { warm_up: 10, max_iterations: 10 }
    );
}

#[test]
fn test_trajectory_bounds_and_best_eligibility() {
    let mut rng = ChaCha20Rng::seed_from_u64(32);
    let target = erdos_renyi(12, 0.4, &mut rng);
    let model = GraphModel::new(12, 1, 0.5);

    let warm_up = 5;
    let max_iterations = 80;
    let result = model
        .populate_edges_spectrum(warm_up, max_iterations, 20, &target, &mut rng)
        .expect("search");

    assert!(result.best_iteration >= warm_up, "best fell inside warm-up");
    assert_eq!(result.graphs.len(), result.divergences.len());
    assert!(result.graphs.len() <= max_iterations);
    assert!(result.graphs.len() > warm_up);

    // The recorded best really is the post-warm-up minimum
    let best_div = result.divergences[result.best_iteration];
    for &d in &result.divergences[warm_up..] {
        assert!(best_div <= d, "found {} below recorded best {}", d, best_div);
    }
    assert_eq!(result.best_spectrum.len(), 12);
}

#[test]
fn test_stagnant_search_stops_at_patience() {
    // sigma = +30 with d = 0 makes every candidate the complete graph,
    // so no strict improvement can ever happen after warm-up.
    let mut rng = ChaCha20Rng::seed_from_u64(33);
    let target = erdos_renyi(10, 0.4, &mut rng);
    let model = GraphModel::new(10, 0, 30.0);

    let warm_up = 4;
    let patience = 6;
    let result = model
        .populate_edges_spectrum(warm_up, 300, patience, &target, &mut rng)
        .expect("search");

    assert_eq!(result.best_iteration, warm_up, "no improvement keeps warm-up best");
    assert_eq!(
        result.divergences.len(),
        warm_up + patience + 1,
        "patience should cut the run short"
    );
}

#[test]
fn test_degenerate_target_fails() {
    let mut target = Graph::empty(5);
    target.add_edge(0, 1);
    target.add_edge(1, 2);
    target.add_edge(2, 3);
    // node 4 isolated
    let mut rng = ChaCha20Rng::seed_from_u64(34);
    let model = GraphModel::new(5, 1, 0.2);

    let err = model
        .populate_edges_spectrum(2, 20, 5, &target, &mut rng)
        .unwrap_err();
    assert_eq!(
        err,
        SearchError::Spectral(SpectralError::DegenerateGraph { node: 4 })
    );
}

#[test]
fn test_all_degenerate_candidates_fail() {
    // sigma = -30 empties every candidate, so no eligible spectrum exists.
    let mut rng = ChaCha20Rng::seed_from_u64(35);
    let target = erdos_renyi(8, 0.6, &mut rng);
    let model = GraphModel::new(8, 0, -30.0);

    let err = model
        .populate_edges_spectrum(2, 40, 5, &target, &mut rng)
        .unwrap_err();
    assert!(matches!(
        err,
        SearchError::Spectral(SpectralError::DegenerateGraph { .. })
    ));
}
