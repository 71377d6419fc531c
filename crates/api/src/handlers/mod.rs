pub mod cursors;
pub mod videos;
