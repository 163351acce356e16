use serde::{Deserialize, Serialize};

/// Row collections exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Profiles,
    Modules,
    Lessons,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Modules => "modules",
            Self::Lessons => "lessons",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Equality filter, `column = value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq<C: Into<String>, V: ToString>(column: C, value: V) -> Self {
        Self {
            column: column.into(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A row query: which collection, which columns, which rows, in what order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub collection: Collection,
    pub select: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

impl Query {
    pub fn from(collection: Collection) -> Self {
        Self {
            collection,
            select: String::from("*"),
            filters: vec![],
            order: None,
        }
    }

    pub fn select<S: Into<String>>(mut self, columns: S) -> Self {
        self.select = columns.into();
        self
    }

    pub fn eq<C: Into<String>, V: ToString>(mut self, column: C, value: V) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order<C: Into<String>>(mut self, column: C, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    /// Query-string pairs in the row service dialect:
    /// `select=*&id=eq.42&order=created_at.desc`.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![(String::from("select"), self.select.clone())];
        params.extend(
            self.filters
                .iter()
                .map(|f| (f.column.clone(), format!("eq.{}", f.value))),
        );
        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push((
                String::from("order"),
                format!("{}.{direction}", order.column),
            ));
        }
        params
    }
}
