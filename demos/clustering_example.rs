use clusterkit::{metrics, Dataset, KMeans, Labels, NeighborSearch, StandardScaler, Table, DBSCAN};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Clustering Algorithms Comparison ===\n");

    // Three natural groups, a few outliers and a ground-truth column that
    // must not be used as a feature.
    let table = Table::new(
        ["x", "y", "target"],
        vec![
            // Cluster 1: around (2, 2)
            vec!["1.5", "1.8", "0"], vec!["2.0", "2.2", "0"], vec!["2.3", "1.9", "0"],
            vec!["1.8", "2.5", "0"], vec!["2.1", "1.7", "0"],
            // Cluster 2: around (8, 8)
            vec!["7.8", "8.2", "1"], vec!["8.1", "7.9", "1"], vec!["8.3", "8.1", "1"],
            vec!["7.9", "8.4", "1"], vec!["8.2", "7.7", "1"],
            // Cluster 3: around (2, 8)
            vec!["1.9", "7.8", "2"], vec!["2.2", "8.1", "2"], vec!["1.7", "8.3", "2"],
            vec!["2.4", "7.9", "2"], vec!["2.0", "8.2", "2"],
            // Some noise points
            vec!["5.0", "5.0", "-1"], vec!["0.0", "0.0", "-1"], vec!["10.0", "0.0", "-1"],
        ],
    )?;

    let x = Dataset::try_from(&table.drop_columns(&["target"])?)?;
    println!("Dataset: {} samples, {} features", x.n_samples(), x.n_features());
    println!("Expected: 3 natural clusters + some noise points\n");

    let x_scaled = StandardScaler::new().fit_transform(&x)?;

    println!("=== K-Means Clustering ===");
    for k in [2, 3, 4, 5] {
        let mut kmeans = KMeans::new(k).random_state(42).max_iter(100);
        match kmeans.fit_predict(&x_scaled) {
            Ok(labels) => println!(
                "K-Means(k={}): {} clusters, Inertia: {:.4}, converged: {}",
                k,
                metrics::n_clusters(&labels),
                kmeans.inertia.unwrap_or_default(),
                kmeans.converged.unwrap_or_default()
            ),
            Err(e) => println!("K-Means(k={}) failed: {}", k, e),
        }
    }

    println!("\n=== DBSCAN Clustering ===");
    let dbscan_configs = [
        (0.3, 2, "Tight clusters"),
        (0.5, 2, "Medium density"),
        (1.0, 2, "Loose clusters"),
        (0.5, 3, "Higher min_samples"),
    ];

    for (eps, min_samples, description) in dbscan_configs {
        let mut dbscan = DBSCAN::new(eps, min_samples).neighbor_search(NeighborSearch::Grid);
        match dbscan.fit_predict(&x_scaled) {
            Ok(labels) => println!(
                "DBSCAN(eps={}, min_samples={}): {} - {} clusters, {} noise points",
                eps,
                min_samples,
                description,
                metrics::n_clusters(&labels),
                metrics::n_noise(&labels)
            ),
            Err(e) => println!("DBSCAN(eps={}, min_samples={}) failed: {}", eps, min_samples, e),
        }
    }

    println!("\n=== Detailed Analysis ===");

    let mut best_kmeans = KMeans::new(3).random_state(42);
    let kmeans_labels = best_kmeans.fit_predict(&x_scaled)?;
    println!("K-Means (k=3) results:");
    println!("  Iterations: {}", best_kmeans.n_iter.unwrap_or_default());
    print_cluster_summary("K-Means", &kmeans_labels);

    let mut best_dbscan = DBSCAN::new(0.5, 2);
    let dbscan_labels = best_dbscan.fit_predict(&x_scaled)?;
    println!("\nDBSCAN (eps=0.5, min_samples=2) results:");
    println!(
        "  Number of core samples: {}",
        best_dbscan.core_sample_indices.as_ref().map_or(0, Vec::len)
    );
    print_cluster_summary("DBSCAN", &dbscan_labels);

    println!("\nGround truth:");
    for (row, target) in table.column("target")?.iter().enumerate() {
        println!(
            "  row {:>2}: target {:>2}, k-means {}, dbscan {:>2}",
            row, target, kmeans_labels[row], dbscan_labels[row]
        );
    }

    Ok(())
}

fn print_cluster_summary(algorithm: &str, labels: &Labels) {
    println!("  {} cluster assignments:", algorithm);
    for (cluster_id, count) in metrics::cluster_sizes(labels) {
        if cluster_id == clusterkit::NOISE {
            println!("    Noise: {} points", count);
        } else {
            println!("    Cluster {}: {} points", cluster_id, count);
        }
    }
}
