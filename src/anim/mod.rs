pub mod driver;
pub mod easing;

pub use driver::{AnimationDriver, AnimationOwner, AnimationToken, StepFn};
pub use easing::{lerp, lerp_vec3, progress, Easing};
