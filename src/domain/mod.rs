// Domain layer: core models and ports (interfaces) for the collaborators around the scoring engine.

pub mod model;
pub mod ports;
