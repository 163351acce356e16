//! Active module/lesson of the lesson player, kept in sync with the
//! `?module=..&lesson=..` query of the `/lesson` page so a shared link
//! reproduces the same view.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub static LESSON_PAGE: &str = "/lesson";

/// Anything the player can select by id.
pub trait Navigable {
    fn nav_id(&self) -> Uuid;
}

/// Raw query parameters of the lesson page. Ids that do not parse are
/// treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LessonQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson: Option<String>,
}

impl LessonQuery {
    pub fn new(module: Option<Uuid>, lesson: Option<Uuid>) -> Self {
        Self {
            module: module.map(|id| id.to_string()),
            lesson: lesson.map(|id| id.to_string()),
        }
    }

    pub fn module_id(&self) -> Option<Uuid> {
        parse_id(self.module.as_deref())
    }

    pub fn lesson_id(&self) -> Option<Uuid> {
        parse_id(self.lesson.as_deref())
    }

    /// `module=..&lesson=..`, absent parts omitted.
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if let Some(module) = &self.module {
            serializer.append_pair("module", module);
        }
        if let Some(lesson) = &self.lesson {
            serializer.append_pair("lesson", lesson);
        }
        serializer.finish()
    }
}

fn parse_id(raw: Option<&str>) -> Option<Uuid> {
    raw.and_then(|raw| raw.trim().parse().ok())
}

/// The requested item when it exists, otherwise the first one.
pub fn pick<T: Navigable>(items: &[T], requested: Option<Uuid>) -> Option<&T> {
    requested
        .and_then(|id| items.iter().find(|item| item.nav_id() == id))
        .or_else(|| items.first())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Empty,
    Module {
        module: Uuid,
    },
    Lesson {
        module: Uuid,
        lesson: Uuid,
    },
}

impl Selection {
    /// First half of mounting the player: choose the module named by the
    /// query, falling back to the first navigable module.
    pub fn mount<M: Navigable>(modules: &[M], query: &LessonQuery) -> Self {
        match pick(modules, query.module_id()) {
            Some(module) => Self::Module {
                module: module.nav_id(),
            },
            None => Self::Empty,
        }
    }

    /// Second half of mounting: once the active module's lessons are loaded,
    /// choose the requested lesson or the first one.
    pub fn with_lessons<L: Navigable>(self, lessons: &[L], requested: Option<Uuid>) -> Self {
        let Some(module) = self.module_id() else {
            return Self::Empty;
        };

        match pick(lessons, requested) {
            Some(lesson) => Self::Lesson {
                module,
                lesson: lesson.nav_id(),
            },
            None => Self::Module { module },
        }
    }

    /// Activates `module` and auto-selects its first lesson.
    pub fn select_module<L: Navigable>(self, module: Uuid, lessons: &[L]) -> Self {
        Self::Module { module }.with_lessons(lessons, None)
    }

    /// Activates `lesson` when it belongs to the active module's `lessons`.
    /// Unknown lessons leave the selection unchanged.
    pub fn select_lesson<L: Navigable>(self, lesson: Uuid, lessons: &[L]) -> Self {
        match self.module_id() {
            Some(module) if lessons.iter().any(|l| l.nav_id() == lesson) => {
                Self::Lesson { module, lesson }
            }
            _ => self,
        }
    }

    pub fn module_id(&self) -> Option<Uuid> {
        match self {
            Self::Empty => None,
            Self::Module { module } | Self::Lesson { module, .. } => Some(*module),
        }
    }

    pub fn lesson_id(&self) -> Option<Uuid> {
        match self {
            Self::Lesson { lesson, .. } => Some(*lesson),
            _ => None,
        }
    }

    pub fn query(&self) -> LessonQuery {
        LessonQuery::new(self.module_id(), self.lesson_id())
    }

    /// Shareable location of this selection.
    pub fn location(&self) -> String {
        let query = self.query().to_query_string();
        if query.is_empty() {
            LESSON_PAGE.to_string()
        } else {
            format!("{LESSON_PAGE}?{query}")
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Item(Uuid);

    impl Navigable for Item {
        fn nav_id(&self) -> Uuid {
            self.0
        }
    }

    fn items(n: usize) -> Vec<Item> {
        (0..n).map(|_| Item(Uuid::new_v4())).collect()
    }

    #[test]
    fn test_mount_without_query_picks_first() {
        let modules = items(2);
        let lessons = items(3);

        let selection = Selection::mount(&modules, &LessonQuery::default());
        assert_eq!(selection, Selection::Module { module: modules[0].0 });

        let selection = selection.with_lessons(&lessons, None);
        assert_eq!(
            selection,
            Selection::Lesson {
                module: modules[0].0,
                lesson: lessons[0].0
            }
        );
    }

    #[test]
    fn test_mount_from_query() {
        let modules = items(3);
        let lessons = items(3);
        let query = LessonQuery::new(Some(modules[2].0), Some(lessons[1].0));

        let selection =
            Selection::mount(&modules, &query).with_lessons(&lessons, query.lesson_id());
        assert_eq!(selection.module_id(), Some(modules[2].0));
        assert_eq!(selection.lesson_id(), Some(lessons[1].0));
    }

    #[test]
    fn test_stale_query_falls_back() {
        let modules = items(2);
        let lessons = items(2);
        let query = LessonQuery::new(Some(Uuid::new_v4()), Some(Uuid::new_v4()));

        let selection =
            Selection::mount(&modules, &query).with_lessons(&lessons, query.lesson_id());
        assert_eq!(selection.module_id(), Some(modules[0].0));
        assert_eq!(selection.lesson_id(), Some(lessons[0].0));

        let garbage = LessonQuery {
            module: Some("not-an-id".into()),
            lesson: Some(String::new()),
        };
        assert_eq!(garbage.module_id(), None);
        assert_eq!(
            Selection::mount(&modules, &garbage).module_id(),
            Some(modules[0].0)
        );
    }

    #[test]
    fn test_empty_sets() {
        let none: Vec<Item> = vec![];
        assert_eq!(Selection::mount(&none, &LessonQuery::default()), Selection::Empty);
        assert_eq!(Selection::Empty.with_lessons(&items(1), None), Selection::Empty);

        let module = Uuid::new_v4();
        let selection = Selection::Module { module }.with_lessons(&none, None);
        assert_eq!(selection, Selection::Module { module });
        assert_eq!(selection.location(), format!("/lesson?module={module}"));
    }

    #[test]
    fn test_select_module_then_lesson_rewrites_query() {
        let modules = items(2);
        let first_lessons = items(1);
        let lessons = items(3);

        let selection = Selection::mount(&modules, &LessonQuery::default())
            .with_lessons(&first_lessons, None)
            .select_module(modules[1].0, &lessons);
        assert_eq!(selection.lesson_id(), Some(lessons[0].0));

        let selection = selection.select_lesson(lessons[2].0, &lessons);
        let query = selection.query();
        assert_eq!(
            query,
            LessonQuery {
                module: Some(modules[1].0.to_string()),
                lesson: Some(lessons[2].0.to_string()),
            }
        );

        // reload with the same parameters
        let reloaded =
            Selection::mount(&modules, &query).with_lessons(&lessons, query.lesson_id());
        assert_eq!(reloaded, selection);
    }

    #[test]
    fn test_select_unknown_lesson_is_ignored() {
        let module = Uuid::new_v4();
        let lessons = items(2);
        let selection = Selection::Module { module }.with_lessons(&lessons, None);

        assert_eq!(selection.select_lesson(Uuid::new_v4(), &lessons), selection);
        assert_eq!(Selection::Empty.select_lesson(lessons[0].0, &lessons), Selection::Empty);
    }

    #[test]
    fn test_location() {
        let module = Uuid::new_v4();
        let lesson = Uuid::new_v4();
        assert_eq!(Selection::Empty.location(), "/lesson");
        assert_eq!(
            Selection::Lesson { module, lesson }.location(),
            format!("/lesson?module={module}&lesson={lesson}")
        );
    }
}
