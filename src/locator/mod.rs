pub mod locator_model;
pub mod record;
pub mod synthesizer;
