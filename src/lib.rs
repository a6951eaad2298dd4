pub mod cli;
pub mod content;
pub mod dom;
pub mod error;
pub mod locator;
pub mod report;
pub mod resolve;
pub mod scan;
pub mod suggest;
pub mod trace;
pub mod verify;
