pub mod anim;
pub mod assets;
pub mod config;
pub mod platform;
pub mod render;
pub mod scene;
pub mod ui;
