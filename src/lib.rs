pub mod accumulation;
pub mod application;
pub mod camera;
pub mod cli;
pub mod error;
pub mod input;
pub mod material;
pub mod picking;
pub mod preview;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod surface;
pub mod util;
pub mod viewer;
pub mod viewport;
