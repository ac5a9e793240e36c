//! End-to-end: estimate, search, and select on a known generative source.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use specfit::estimator::LogitRegEstimator;
use specfit::graph::Graph;
use specfit::model_selection::{erdos_renyi, GraphModelSelection, ModelKind, ParamRange};
use specfit::search::GraphModel;
use specfit::spectral::DivergenceKind;

#[test]
fn test_er_source_ranks_er_in_the_top_two() {
    let mut rng = ChaCha20Rng::seed_from_u64(4242);
    let observed = erdos_renyi(20, 0.3, &mut rng);
    assert!(observed.m() > 0);

    // Estimation
    let estimator = LogitRegEstimator::new(&observed, 1);
    let fitted = estimator.fit(1.0, 0.0).expect("logistic fit");
    assert_eq!(fitted.n, 20);
    assert!(fitted.sigma.is_finite());

    // Generation: spectrum-guided search from the fitted process
    let model = GraphModel::new(20, 1, fitted.sigma);
    let result = model
        .populate_edges_spectrum(50, 500, 50, &observed, &mut rng)
        .expect("search");
    assert!(result.best_iteration >= 50);
    assert!(result.divergences.len() <= 500);

    // The fitted model is represented by its last few candidates
    let tail = 10.min(result.graphs.len());
    let log_graphs: Vec<Graph> = result.graphs[result.graphs.len() - tail..].to_vec();
    let log_params = vec![fitted.sigma; log_graphs.len()];

    let selection = GraphModelSelection::new(
        &observed,
        &log_graphs,
        &log_params,
        ModelKind::ALL.to_vec(),
        vec![
            ParamRange { lo: 0.01, hi: 1.0 }, // ER
            ParamRange { lo: 0.01, hi: 1.0 }, // WS
            ParamRange { lo: 0.05, hi: 1.0 }, // GRG
            ParamRange { lo: 1.0, hi: 5.0 },  // BA
        ],
        10,
        DivergenceKind::Kl,
    )
    .with_seed(4242)
    .select_model()
    .expect("selection");

    assert_eq!(selection.estimates.len(), 5);
    let er_rank = selection
        .estimates
        .iter()
        .position(|e| e.model == ModelKind::Er)
        .expect("ER estimate present");
    assert!(
        er_rank <= 1,
        "ER ranked {} (estimates: {:?})",
        er_rank,
        selection
            .estimates
            .iter()
            .map(|e| (e.model.label(), e.gic))
            .collect::<Vec<_>>()
    );
}
