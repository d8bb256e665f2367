// Domain layer - Interval algebra and gap policy

pub mod errors;
pub mod model;
pub mod rules;
