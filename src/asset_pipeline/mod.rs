pub mod generate_tangents;
pub mod images;
pub mod materials;
pub mod primitives;
pub mod starfield;
