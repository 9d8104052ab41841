use base::log;
use liveness::{LivenessConfig, LivenessServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // optional JSON config path as the first argument
    let config = match std::env::args().nth(1) {
        Some(path) => LivenessConfig::from_file(&path)?,
        None => LivenessConfig::default(),
    };

    match &config.server.log_dir {
        Some(dir) => base::init_file_logger(dir)?,
        None => base::init_stdout_logger(),
    }

    log::info!("Finger liveness server");
    log::info!(
        "Threshold {:.2}, window {}, decision after {} frames, auto-reset {} ms",
        config.fusion.threshold,
        config.session.window_size,
        config.session.min_frames,
        config.session.auto_reset_ms
    );
    log::info!("Results are saved to {}", config.persist.output_dir);

    let server = LivenessServer::bind(config).await?;
    server.run().await?;
    Ok(())
}
