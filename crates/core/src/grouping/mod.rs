pub mod dbscan;
pub mod face_group;
pub mod pose;
