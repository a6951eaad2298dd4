pub mod context;
pub mod describe;
pub mod scanner;
