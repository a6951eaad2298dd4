pub mod css;
pub mod dom_model;
pub mod query;
pub mod visibility;
pub mod xpath;
