mod profile;
pub use profile::{DEFAULT_DISPLAY_NAME, Profile, Role, display_name};

mod module;
pub use module::{Module, ModuleCreate};

mod lesson;
pub use lesson::{Lesson, LessonCreate};
