pub mod healing;
pub mod resolver;
