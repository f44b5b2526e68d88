pub mod county;
pub mod error;
pub mod formula;
