pub mod paths;
pub mod quote;
