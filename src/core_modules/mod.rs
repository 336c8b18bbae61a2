pub mod centroid;
pub mod collision;
pub mod education;
pub mod frame_differencer;
pub mod metrics;
pub mod pixel;
pub mod player;
pub mod session;
pub mod simulator;
pub mod smoother;
pub mod theme;
pub mod utils;
