pub mod bbox;
pub mod constants;
pub mod frame;
pub mod media_info;
