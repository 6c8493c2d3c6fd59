pub mod collision;
pub mod entity;
pub mod grid;
pub mod history;
pub mod input_buffer;
pub mod motion;
pub mod tile;
