pub mod cell;
pub mod color;
pub mod grid;
pub mod groups;
pub mod jelly;
