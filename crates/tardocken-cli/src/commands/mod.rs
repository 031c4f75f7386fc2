mod build;

pub use build::{BuildPlan, build};
