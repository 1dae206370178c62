pub mod arcface_embedder;
mod execution_provider;
pub mod gender_age_estimator;
pub mod landmark_refiner;
pub mod model_bundle;
pub mod retinaface_detector;
mod session;
