pub mod assumptions;
pub mod compare;
pub mod project;
pub mod scenarios;
