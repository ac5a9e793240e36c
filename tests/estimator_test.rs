use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use specfit::error::EstimatorError;
use specfit::estimator::LogitRegEstimator;
use specfit::graph::Graph;
use specfit::model_selection::erdos_renyi;

fn complete(n: usize) -> Graph {
    let mut g = Graph::empty(n);
    for i in 0..n {
        for j in (i + 1)..n {
            g.add_edge(i, j);
        }
    }
    g
}

/// Two cliques of `size` joined by a single bridge edge.
fn two_cliques(size: usize) -> Graph {
    let mut g = Graph::empty(2 * size);
    for i in 0..size {
        for j in (i + 1)..size {
            g.add_edge(i, j);
            g.add_edge(size + i, size + j);
        }
    }
    g.add_edge(0, size);
    g
}

#[test]
fn test_feature_table_shape() {
    let mut rng = ChaCha20Rng::seed_from_u64(21);
    let g = erdos_renyi(12, 0.4, &mut rng);

    for d in 0..4 {
        let est = LogitRegEstimator::new(&g, d);
        let (features, labels) = est.get_features_labels().expect("table");
        assert_eq!(features.nrows(), 12 * 11 / 2, "one row per unordered pair");
        assert_eq!(features.ncols(), d.max(1), "d = {} feature columns", d);
        assert_eq!(labels.len(), features.nrows());
        assert_eq!(
            labels.iter().filter(|&&y| y == 1.0).count(),
            g.m(),
            "positive labels match edge count"
        );
    }
}

#[test]
fn test_feature_table_is_deterministic() {
    let mut rng = ChaCha20Rng::seed_from_u64(22);
    let g = erdos_renyi(10, 0.5, &mut rng);
    let est = LogitRegEstimator::new(&g, 2);

    let (f1, l1) = est.get_features_labels().expect("first");
    let (f2, l2) = est.get_features_labels().expect("second");
    assert_eq!(f1, f2);
    assert_eq!(l1, l2);
}

#[test]
fn test_features_lie_in_unit_interval() {
    let g = two_cliques(5);
    let est = LogitRegEstimator::new(&g, 3);
    let (features, _) = est.get_features_labels().expect("table");
    for v in features.iter() {
        assert!((0.0..=1.0).contains(v), "feature {} out of [0, 1]", v);
    }
}

#[test]
fn test_constant_labels_are_rejected() {
    // No edges at all
    let empty = Graph::empty(6);
    let est = LogitRegEstimator::new(&empty, 1);
    let (features, labels) = est.get_features_labels().expect("table");
    assert!(matches!(
        est.estimate_parameters(1.0, 0.0, &features, &labels),
        Err(EstimatorError::DegenerateInput(_))
    ));

    // Every pair an edge
    let full = complete(6);
    let est = LogitRegEstimator::new(&full, 1);
    let (features, labels) = est.get_features_labels().expect("table");
    assert!(matches!(
        est.estimate_parameters(1.0, 0.0, &features, &labels),
        Err(EstimatorError::DegenerateInput(_))
    ));
}

#[test]
fn test_unregularized_fit_converges_on_er_graph() {
    let mut rng = ChaCha20Rng::seed_from_u64(23);
    let g = erdos_renyi(15, 0.4, &mut rng);
    let est = LogitRegEstimator::new(&g, 1);
    let (features, labels) = est.get_features_labels().expect("table");

    let fit = est
        .estimate_parameters(1.0, 0.0, &features, &labels)
        .expect("IRLS should converge on overlapping classes");
    assert_eq!(fit.params.len(), 2, "one structural coefficient plus intercept");
    assert!(fit.params.iter().all(|p| p.is_finite()));
    assert!(fit.neg_log_likelihood.is_finite());
    assert!(
        fit.p_value.is_nan() || (0.0..=1.0).contains(&fit.p_value),
        "p-value {} out of range",
        fit.p_value
    );
}

#[test]
fn test_ridge_fit_finds_positive_sigma_on_clustered_graph() {
    // Within-clique pairs are edges with many common neighbors; cross
    // pairs are non-edges with almost none. A penalized fit keeps the
    // coefficients finite and the association positive.
    let g = two_cliques(6);
    let est = LogitRegEstimator::new(&g, 1);
    let fitted = est.fit(0.0, 0.1).expect("ridge fit");

    assert_eq!(fitted.n, 12);
    assert_eq!(fitted.d, 1);
    assert!(
        fitted.sigma > 0.0,
        "sigma {} should be positive when edges follow common neighbors",
        fitted.sigma
    );
}

#[test]
fn test_lasso_path_converges() {
    let mut rng = ChaCha20Rng::seed_from_u64(24);
    let g = erdos_renyi(14, 0.35, &mut rng);
    let est = LogitRegEstimator::new(&g, 2);
    let (features, labels) = est.get_features_labels().expect("table");

    let fit = est
        .estimate_parameters(1.0, 0.05, &features, &labels)
        .expect("proximal gradient should converge");
    assert_eq!(fit.params.len(), 3);
    assert!(fit.params.iter().all(|p| p.is_finite()));
}
