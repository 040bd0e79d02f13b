use vq::{Lbg, Tokhura, Universe};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Minimal end-to-end: synthetic universe -> LBG training -> codebook.
    //
    // Real pipelines load cepstral vectors with `Universe::from_csv` and
    // train with `Tokhura::cepstral12()`; this stays small and synthetic
    // so it runs anywhere.

    // Three obvious clusters in 2D, a handful of vectors each.
    let mut rows: Vec<Vec<f32>> = Vec::new();
    for (cx, cy) in [(0.0f32, 0.0f32), (8.0, 8.0), (16.0, 0.0)] {
        for i in 0..6 {
            let dx = (i as f32) * 0.1;
            let dy = ((i % 3) as f32) * 0.1;
            rows.push(vec![cx + dx, cy + dy]);
        }
    }
    let universe = Universe::from_rows(&rows)?;

    let training = Lbg::new(3)
        .with_seed(42)
        .with_delta(1e-5)
        .with_max_iter(50)
        .train(&universe)?;

    println!(
        "converged={} iterations={} mean_distortion={:.6} reseeded={}",
        training.converged,
        training.iterations,
        training.mean_distortion,
        training.reseeded_regions
    );
    println!("codebook:");
    for (i, row) in training.codebook.to_rows().iter().enumerate() {
        println!("  {i}: {row:?}");
    }

    // Encode a fresh vector against the trained codebook.
    let metric = Tokhura::unit(universe.dim());
    let nearest = training.codebook.quantize(&[7.9, 8.2], &metric)?;
    println!(
        "query [7.9, 8.2] -> codeword {} (distance {:.4})",
        nearest.index, nearest.distance
    );

    Ok(())
}
