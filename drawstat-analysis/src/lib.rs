pub mod chi_square;
pub mod context;
pub mod distribution;
pub mod ensemble;
pub mod frequency;
pub mod gap;
pub mod patterns;
pub mod rng;
pub mod sampler;
pub mod session;
pub mod strategy;
pub mod testing;
