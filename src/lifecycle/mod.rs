//! Element lifecycle state: per-element data and in-flight animations.

pub mod animation;
pub mod data;

pub use animation::{Animation, AnimationDescriptor, Animator, Completion, Speed};
pub use data::ElementStore;
