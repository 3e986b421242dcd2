pub mod committee;
pub mod header;
pub mod proof;
