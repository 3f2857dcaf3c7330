// ============================================
// Snowfield - Демо движка деформации
// ============================================
// Использование: snowfield [config.json]

use snowfield::runtime::{run, EngineConfig, WalkSettings};

fn main() {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}, using defaults", e);
                EngineConfig::default()
            }
        },
        None => EngineConfig::default(),
    };

    let report = run(config, WalkSettings::default());

    println!("=== Snowfield ===");
    println!(
        "Operators: {} recenter, {} stamp, {} decay",
        report.operators.recenters, report.operators.stamps, report.operators.decays
    );
    println!(
        "Chunks: {} built, {} subdivided, {} cache clears",
        report.chunks_built, report.chunks_subdivided, report.cache_clears
    );
    println!(
        "Uploads: {} KiB grid, {} KiB chunk meshes ({} chunks evicted)",
        report.grid_upload_bytes / 1024,
        report.mesh_upload_bytes / 1024,
        report.chunks_evicted
    );
    println!("Max depth in window: {:.1}", report.max_depth);
    println!(
        "Actor ended at ({:.0}, {:.0})",
        report.final_position.x, report.final_position.y
    );
}
