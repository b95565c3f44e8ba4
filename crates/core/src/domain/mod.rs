pub mod campaign;
pub mod catalog;
pub mod recommendation;
