pub mod loader;
pub mod normalizer;
