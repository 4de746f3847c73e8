use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use spatial_autocorr::{
    geary_test, moran_mc, moran_test, AnalyticConfig, MonteCarloConfig, NeighborGraph, Style,
    WeightMatrix,
};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // 5つのポリゴンの隣接関係
    let graph = NeighborGraph::from_edges(
        5,
        [(0, 1), (0, 3), (1, 2), (1, 3), (1, 4), (2, 3), (3, 4)],
    )?;
    let values = [10.0, 6.0, 4.0, 11.0, 6.0];

    println!("{}", graph.summary());

    for style in ["B", "W"] {
        let w = WeightMatrix::derive(&graph, style.parse::<Style>()?);
        info!("Style {}: S0 = {}", style, w.s0());

        let moran = moran_test(&values, &w, &AnalyticConfig::default())?;
        let geary = geary_test(&values, &w, &AnalyticConfig::default())?;
        println!(
            "[{}] Moran's I = {:.6} (E[I] = {:.2}), Geary's C = {:.6}",
            style, moran.i, moran.expected, geary.c
        );
        if let Some(test) = moran.analytic {
            println!("  z = {:.4}, p = {:.4}", test.z_score, test.p_value);
        }

        // シード固定で再現可能なモンテカルロ検定
        let mut rng = StdRng::seed_from_u64(1);
        let mc = moran_mc(&values, &w, &MonteCarloConfig::default(), &mut rng)?;
        if let Some(test) = mc.monte_carlo {
            println!(
                "  Monte Carlo: {} simulations, p = {:.2}",
                test.simulated.len(),
                test.p_value
            );
        }
    }

    Ok(())
}
