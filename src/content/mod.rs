pub mod dynamic;
pub mod identifiers;
pub mod normalize;
