pub mod embed;
pub use embed::Embed;

pub mod navigation;
pub use navigation::{LessonQuery, Navigable, Selection};
