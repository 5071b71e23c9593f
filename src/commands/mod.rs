pub mod build;
pub mod canonicalize;
pub mod extract;
