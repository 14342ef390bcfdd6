pub mod aabb;
pub mod animation;
pub mod attrs;
pub mod canvas;
pub mod components;
pub mod config;
pub mod ecs;
pub mod group;
pub mod math;
pub mod render;
pub mod scene;
pub mod shape;

pub use canvas::Canvas;
pub use config::CanvasConfig;
pub use ecs::Entity;
pub use group::Group;
pub use render::FrameStats;
pub use scene::{NodeConfig, Scene};
pub use shape::Shape;
