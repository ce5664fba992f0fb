// Music theory primitives - scales and interval patterns

pub mod scale;

pub use scale::{C1, C2, C3, Scale, ScaleError, patterns};
