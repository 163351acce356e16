//! In-process [`Backend`] with the same observable behaviour as the hosted
//! one: password sign in, bearer tokens, JSON rows with generated `id` and
//! `created_at`, and an object store that remembers every upload.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use super::{AuthUser, Backend, BackendError, BackendResult, Collection, Query, Session};

pub static MEMORY_STORAGE_URL: &str = "memory://storage";

#[derive(Debug, Clone)]
struct Account {
    user: AuthUser,
    password: String,
}

/// A stored object.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Default)]
struct Tables {
    accounts: Vec<Account>,
    sessions: HashMap<String, Uuid>,
    rows: HashMap<Collection, Vec<Value>>,
    objects: Vec<StoredObject>,
    fail_writes: Option<String>,
    fail_reads: HashMap<Collection, String>,
    fail_sessions: Option<String>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing `created_at`, so rows inserted back to back keep
    /// their insertion order when sorted by time.
    fn now(&mut self) -> String {
        let mut now = Utc::now();
        if let Some(last) = self.last_stamp.filter(|last| *last >= now) {
            now = last + TimeDelta::microseconds(1);
        }
        self.last_stamp = Some(now);
        now.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn stamp(&mut self, mut row: Value) -> Value {
        if let Some(obj) = row.as_object_mut() {
            obj.entry("id")
                .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
            if !obj.contains_key("created_at") {
                obj.insert(String::from("created_at"), Value::String(self.now()));
            }
        }
        row
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
}

/// Filter values travel as text, so columns are compared in text form too.
fn as_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::from("null"),
        other => other.to_string(),
    }
}

fn compare(a: &Value, b: &Value) -> std::cmp::Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        _ => as_param(a).cmp(&as_param(b)),
    }
}

fn matches(row: &Value, query: &Query) -> bool {
    query
        .filters
        .iter()
        .all(|f| row.get(&f.column).map(as_param).as_deref() == Some(f.value.as_str()))
}

fn project(row: &Value, select: &str) -> Value {
    if select.trim() == "*" {
        return row.clone();
    }

    let projected: Map<String, Value> = select
        .split(',')
        .map(str::trim)
        .filter(|column| !column.is_empty())
        .filter_map(|column| row.get(column).map(|v| (column.to_string(), v.clone())))
        .collect();
    Value::Object(projected)
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // a panic while holding the lock leaves the tables usable
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_session(tables: &Tables, token: &str) -> BackendResult<()> {
        if token.is_empty() || tables.sessions.contains_key(token) {
            Ok(())
        } else {
            Err(BackendError::api(401, "JWT expired"))
        }
    }

    fn check_writable(tables: &Tables) -> BackendResult<()> {
        match &tables.fail_writes {
            Some(message) => Err(BackendError::api(500, message.clone())),
            None => Ok(()),
        }
    }

    fn check_readable(tables: &Tables, collection: Collection) -> BackendResult<()> {
        match tables.fail_reads.get(&collection) {
            Some(message) => Err(BackendError::api(500, message.clone())),
            None => Ok(()),
        }
    }

    /// Registers an account and its profile row; returns the user id.
    pub fn seed_user(&self, email: &str, password: &str, full_name: Option<&str>, role: &str) -> Uuid {
        let id = Uuid::new_v4();
        let mut tables = self.tables();
        let created_at = tables.now();
        tables.accounts.push(Account {
            user: AuthUser {
                id,
                email: Some(email.to_string()),
            },
            password: password.to_string(),
        });
        tables.rows.entry(Collection::Profiles).or_default().push(json!({
            "id": id,
            "full_name": full_name,
            "role": role,
            "created_at": created_at,
        }));
        id
    }

    pub fn seed_module(&self, title: &str, order_index: i32, is_locked: bool) -> Uuid {
        self.seed_row(
            Collection::Modules,
            json!({
                "title": title,
                "image_url": format!("https://img.example.com/{order_index}.jpg"),
                "is_locked": is_locked,
                "order_index": order_index,
            }),
        )
    }

    pub fn seed_lesson(&self, module_id: Uuid, title: &str, video_url: &str) -> Uuid {
        self.seed_row(
            Collection::Lessons,
            json!({
                "module_id": module_id,
                "title": title,
                "video_url": video_url,
                "description": null,
                "pdf_url": null,
            }),
        )
    }

    fn seed_row(&self, collection: Collection, row: Value) -> Uuid {
        let mut tables = self.tables();
        let row = tables.stamp(row);
        let id = row["id"].as_str().and_then(|id| id.parse().ok()).unwrap_or_default();
        tables.rows.entry(collection).or_default().push(row);
        id
    }

    /// Snapshot of a collection, in insertion order.
    pub fn rows(&self, collection: Collection) -> Vec<Value> {
        self.tables()
            .rows
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Every object uploaded so far.
    pub fn objects(&self) -> Vec<StoredObject> {
        self.tables().objects.clone()
    }

    /// Makes every following row or storage write fail with `message`.
    pub fn fail_writes<S: Into<String>>(&self, message: S) {
        self.tables().fail_writes = Some(message.into());
    }

    /// Makes every following select or count on `collection` fail with `message`.
    pub fn fail_reads<S: Into<String>>(&self, collection: Collection, message: S) {
        self.tables().fail_reads.insert(collection, message.into());
    }

    /// Makes the session lookup fail as if the auth service were down.
    pub fn fail_session_lookups<S: Into<String>>(&self, message: S) {
        self.tables().fail_sessions = Some(message.into());
    }

    /// Clears every failure switch.
    pub fn recover(&self) {
        let mut tables = self.tables();
        tables.fail_writes = None;
        tables.fail_reads.clear();
        tables.fail_sessions = None;
    }
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        let mut tables = self.tables();
        let user = tables
            .accounts
            .iter()
            .find(|a| a.user.email.as_deref() == Some(email) && a.password == password)
            .map(|a| a.user.clone())
            .ok_or_else(|| BackendError::api(400, "Invalid login credentials"))?;

        let token = Uuid::new_v4().simple().to_string();
        tables.sessions.insert(token.clone(), user.id);

        Ok(Session {
            access_token: token,
            expires_in: Some(3600),
            user,
        })
    }

    async fn get_user(&self, token: &str) -> BackendResult<Option<AuthUser>> {
        let tables = self.tables();
        if let Some(message) = &tables.fail_sessions {
            return Err(BackendError::api(503, message.clone()));
        }
        let user = tables.sessions.get(token).and_then(|id| {
            tables
                .accounts
                .iter()
                .find(|a| a.user.id == *id)
                .map(|a| a.user.clone())
        });
        Ok(user)
    }

    async fn sign_out(&self, token: &str) -> BackendResult<()> {
        self.tables().sessions.remove(token);
        Ok(())
    }

    async fn select(&self, token: &str, query: &Query) -> BackendResult<Vec<Value>> {
        let tables = self.tables();
        Self::check_session(&tables, token)?;
        Self::check_readable(&tables, query.collection)?;

        let mut rows: Vec<Value> = tables
            .rows
            .get(&query.collection)
            .map(|rows| rows.iter().filter(|row| matches(row, query)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.ascending { ord } else { ord.reverse() }
            });
        }

        Ok(rows.iter().map(|row| project(row, &query.select)).collect())
    }

    async fn count(&self, token: &str, collection: Collection) -> BackendResult<i64> {
        let tables = self.tables();
        Self::check_session(&tables, token)?;
        Self::check_readable(&tables, collection)?;
        Ok(tables.rows.get(&collection).map_or(0, |rows| rows.len() as i64))
    }

    async fn insert(&self, token: &str, collection: Collection, row: Value) -> BackendResult<Value> {
        let mut tables = self.tables();
        Self::check_session(&tables, token)?;
        Self::check_writable(&tables)?;

        if !row.is_object() {
            return Err(BackendError::api(400, "row must be an object"));
        }

        let row = tables.stamp(row);
        tables.rows.entry(collection).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, token: &str, query: &Query, patch: Value) -> BackendResult<()> {
        let mut tables = self.tables();
        Self::check_session(&tables, token)?;
        Self::check_writable(&tables)?;

        let Some(patch) = patch.as_object() else {
            return Err(BackendError::api(400, "patch must be an object"));
        };

        for row in tables.rows.entry(query.collection).or_default().iter_mut() {
            if !matches(row, query) {
                continue;
            }
            if let Some(obj) = row.as_object_mut() {
                for (key, value) in patch {
                    obj.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, token: &str, query: &Query) -> BackendResult<()> {
        let mut tables = self.tables();
        Self::check_session(&tables, token)?;
        Self::check_writable(&tables)?;

        tables
            .rows
            .entry(query.collection)
            .or_default()
            .retain(|row| !matches(row, query));
        Ok(())
    }

    async fn upload(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> BackendResult<()> {
        let mut tables = self.tables();
        Self::check_session(&tables, token)?;
        Self::check_writable(&tables)?;

        if tables.objects.iter().any(|o| o.bucket == bucket && o.path == path) {
            return Err(BackendError::api(409, "The resource already exists"));
        }

        tables.objects.push(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len(),
        });
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{MEMORY_STORAGE_URL}/{bucket}/{path}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_and_session() {
        let backend = MemoryBackend::new();
        let id = backend.seed_user("ana@example.com", "secret", Some("Ana"), "student");

        let err = backend.sign_in("ana@example.com", "wrong").await.unwrap_err();
        assert_eq!(err.message(), "Invalid login credentials");

        let session = backend.sign_in("ana@example.com", "secret").await.unwrap();
        assert_eq!(session.user.id, id);

        let user = backend.get_user(&session.access_token).await.unwrap();
        assert_eq!(user.map(|u| u.id), Some(id));

        backend.sign_out(&session.access_token).await.unwrap();
        assert!(backend.get_user(&session.access_token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_select_filter_order_project() {
        let backend = MemoryBackend::new();
        let second = backend.seed_module("Second", 2, false);
        let first = backend.seed_module("First", 1, true);

        let query = Query::from(Collection::Modules)
            .select("id, title")
            .order("order_index", true);
        let rows = backend.select("", &query).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], first.to_string());
        assert_eq!(rows[1]["id"], second.to_string());
        assert!(rows[0].get("order_index").is_none());

        let locked = Query::from(Collection::Modules).eq("is_locked", true);
        let rows = backend.select("", &locked).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "First");
    }

    #[tokio::test]
    async fn test_update_delete_count() {
        let backend = MemoryBackend::new();
        let module = backend.seed_module("M", 1, false);
        let lesson = backend.seed_lesson(module, "L1", "https://vimeo.com/1");
        backend.seed_lesson(module, "L2", "https://vimeo.com/2");

        let by_id = Query::from(Collection::Lessons).eq("id", lesson);
        backend
            .update("", &by_id, json!({ "title": "Renamed" }))
            .await
            .unwrap();
        let rows = backend.select("", &by_id).await.unwrap();
        assert_eq!(rows[0]["title"], "Renamed");

        backend.delete("", &by_id).await.unwrap();
        assert_eq!(backend.count("", Collection::Lessons).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_token_rejected() {
        let backend = MemoryBackend::new();
        let err = backend
            .select("stale", &Query::from(Collection::Modules))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_failing_writes() {
        let backend = MemoryBackend::new();
        backend.fail_writes("storage offline");
        let err = backend
            .upload("", "materials", "a.pdf", "application/pdf", vec![1, 2, 3])
            .await
            .unwrap_err();
        assert_eq!(err.message(), "storage offline");
        assert!(backend.objects().is_empty());
    }

    #[tokio::test]
    async fn test_failing_reads_and_recover() {
        let backend = MemoryBackend::new();
        backend.seed_module("M", 1, false);
        backend.fail_reads(Collection::Lessons, "relation lessons is offline");
        backend.fail_session_lookups("auth offline");

        let err = backend
            .select("", &Query::from(Collection::Lessons))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "relation lessons is offline");
        assert!(backend.count("", Collection::Lessons).await.is_err());
        assert_eq!(backend.count("", Collection::Modules).await.unwrap(), 1);

        let err = backend.get_user("any").await.unwrap_err();
        assert_eq!(err.status(), Some(503));

        backend.recover();
        assert!(backend.select("", &Query::from(Collection::Lessons)).await.is_ok());
        assert!(backend.get_user("any").await.unwrap().is_none());
    }
}
