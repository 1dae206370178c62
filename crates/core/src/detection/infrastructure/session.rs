use std::path::Path;

use super::execution_provider::preferred_execution_providers;

/// Builds an ONNX Runtime session with the settings every backend shares.
///
/// Sessions are loaded once per job and shared read-only behind a `Mutex`;
/// intra-op parallelism uses every available core.
pub(crate) fn build_session(
    model_path: &Path,
) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    let intra_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    let session = ort::session::Session::builder()?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
        .with_inter_threads(1)?
        .with_intra_threads(intra_threads)?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;
    Ok(session)
}
