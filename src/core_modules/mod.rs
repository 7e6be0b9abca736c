pub mod hue_classifier;
pub mod pixel_color;
pub mod region_enumerator;
pub mod region_scanner;
pub mod scene_reader;
pub mod screen_buffer;
pub mod surface;
