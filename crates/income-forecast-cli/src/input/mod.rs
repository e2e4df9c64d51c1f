pub mod actuals;
pub mod file;
pub mod stdin;
