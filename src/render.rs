pub mod background;
pub mod compose;
