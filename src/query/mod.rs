pub mod builder;
pub mod sort;
