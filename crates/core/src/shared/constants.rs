pub const DETECTOR_MODEL_NAME: &str = "det_10g.onnx";
pub const LANDMARK_MODEL_NAME: &str = "landmark_2d_68.onnx";
pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const ATTRIBUTE_MODEL_NAME: &str = "genderage.onnx";

/// Fixed square input resolution of the face detector.
pub const DETECTOR_INPUT_SIZE: u32 = 640;

/// Side of the pose-normalized patch fed to the 68-point landmarker.
pub const LANDMARK_PATCH_SIZE: u32 = 192;

/// Side of the aligned crop fed to the embedding model.
pub const EMBEDDING_INPUT_SIZE: u32 = 112;

/// Side of the crop fed to the gender/age model.
pub const ATTRIBUTE_INPUT_SIZE: u32 = 96;

pub const EMBEDDING_DIM: usize = 512;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
