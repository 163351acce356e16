use std::collections::HashMap;
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::MultipartForm;
use mestre::backend::MemoryBackend;
use mestre::{Config, build_server_with_backend};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower_cookies::Cookie;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "ana@mestre.test";
pub const ADMIN_PASSWORD: &str = "admin-pass";
pub const STUDENT_EMAIL: &str = "joao.silva@mestre.test";
pub const STUDENT_PASSWORD: &str = "student-pass";

/// Lesson materials above this size are refused by the test server.
#[allow(unused)]
pub const TEST_MATERIAL_MAX_BYTES: usize = 1024;

#[allow(unused)]
pub const SHELL_HTML: &str = "<!doctype html><title>mestre</title><div id=\"app\"></div>";

/// Ids of the seeded course. `intro` and `advanced` are open, `vault` is locked.
/// Lessons of a module are listed in the order below.
#[allow(unused)]
#[derive(Debug, Clone, Copy)]
pub struct Seed {
    pub admin: Uuid,
    pub student: Uuid,
    pub intro: Uuid,
    pub advanced: Uuid,
    pub vault: Uuid,
    pub intro_welcome: Uuid,
    pub intro_tools: Uuid,
    pub advanced_drive: Uuid,
    pub vault_secret: Uuid,
}

/// Backend, seed ids and the directory holding the front-end shell. The
/// directory is removed once the fixture goes out of scope.
pub struct Fixture {
    pub backend: Arc<MemoryBackend>,
    pub seed: Seed,
    static_dir: TempDir,
}

impl Fixture {
    #[allow(unused)]
    pub fn static_dir(&self) -> &std::path::Path {
        self.static_dir.path()
    }
}

pub fn setup_fixture() -> Fixture {
    let backend = Arc::new(MemoryBackend::new());

    let admin = backend.seed_user(ADMIN_EMAIL, ADMIN_PASSWORD, Some("Ana Admin"), "admin");
    let student = backend.seed_user(STUDENT_EMAIL, STUDENT_PASSWORD, None, "student");

    let intro = backend.seed_module("Getting started", 1, false);
    let advanced = backend.seed_module("Advanced techniques", 2, false);
    let vault = backend.seed_module("Bonus vault", 3, true);

    let intro_welcome = backend.seed_lesson(intro, "Welcome", "https://www.youtube.com/watch?v=abc123");
    let intro_tools = backend.seed_lesson(intro, "Tools", "https://vimeo.com/76979871");
    let advanced_drive = backend.seed_lesson(
        advanced,
        "Shared notes",
        "https://drive.google.com/file/d/xyz/view",
    );
    let vault_secret = backend.seed_lesson(vault, "Secret recipe", "https://youtu.be/zzz");

    let static_dir = tempfile::tempdir().expect("Unable to create static dir");
    std::fs::write(static_dir.path().join("index.html"), SHELL_HTML)
        .expect("Unable to write index.html");
    std::fs::write(static_dir.path().join("app.js"), "console.log('mestre');")
        .expect("Unable to write app.js");

    Fixture {
        backend,
        seed: Seed {
            admin,
            student,
            intro,
            advanced,
            vault,
            intro_welcome,
            intro_tools,
            advanced_drive,
            vault_secret,
        },
        static_dir,
    }
}

pub fn test_config(fixture: &Fixture) -> Config {
    let toml = format!(
        r#"
[app]
static_dir = '{}'
material_max_bytes = {TEST_MATERIAL_MAX_BYTES}
materials_bucket = "materials"
"#,
        fixture.static_dir().display()
    );
    Config::from_toml_str(&toml).expect("Invalid test config")
}

pub async fn setup_server(fixture: &Fixture) -> TestServer {
    let server = build_server_with_backend(fixture.backend.clone(), test_config(fixture))
        .await
        .unwrap()
        .1;
    TestServer::new(server).unwrap()
}

/// Parses a response body captured by [`Action::assert_body`].
pub fn json_body(body: &str) -> Value {
    serde_json::from_str(body).expect("Invalid JSON body")
}

#[derive(Debug)]
pub struct FlowContext {
    pub store: HashMap<&'static str, Value>, // a way to pass data between steps
}

impl FlowContext {
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
        }
    }

    pub fn store(&mut self, key: &'static str, val: Value) {
        self.store.insert(key, val);
    }

    pub fn get(&self, key: &str) -> &Value {
        self.store.get(key).expect("missing store key")
    }

    #[allow(unused)]
    pub fn get_json<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned,
    {
        let obj = self.get(key);
        serde_json::from_value(obj.clone()).expect("Invalid json format")
    }
}

type FormBuilder = Box<dyn Fn(&FlowContext) -> MultipartForm + Send + Sync>;

pub struct Action {
    pub name: &'static str,
    pub method: &'static str,
    pub path: String,
    pub dyn_path: Option<Box<dyn Fn(&FlowContext) -> String + Send + Sync>>,
    pub body: Option<Value>,
    pub form: Option<FormBuilder>,
    pub expect: StatusCode,
    pub clear_cookies: bool,
    pub save_cookies: bool,
    pub query_params: Vec<(String, String)>,
    pub cookie_asserts: Vec<(&'static str, Box<dyn Fn(&Cookie) + Send + Sync>)>,
    pub absent_cookies: Vec<&'static str>,
    pub header_asserts: Vec<(&'static str, String)>,
    pub body_asserts: Vec<Box<dyn Fn(&str) + Send + Sync>>,
    pub text_asserts: Vec<Box<dyn Fn(&str) + Send + Sync>>,
    pub save_as: Option<&'static str>,
}

impl Action {
    pub fn new(name: &'static str, method: &'static str, path: &str) -> Self {
        Self {
            name,
            method,
            path: path.to_string(),
            dyn_path: None,
            body: None,
            form: None,
            expect: StatusCode::OK,
            clear_cookies: false,
            save_cookies: true,
            query_params: vec![],
            cookie_asserts: vec![],
            absent_cookies: vec![],
            header_asserts: vec![],
            body_asserts: vec![],
            text_asserts: vec![],
            save_as: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Multipart body, built when the step runs.
    #[allow(unused)]
    pub fn with_form<F>(mut self, f: F) -> Self
    where
        F: Fn(&FlowContext) -> MultipartForm + Send + Sync + 'static,
    {
        self.form = Some(Box::new(f));
        self
    }

    pub fn with_expect(mut self, expect: StatusCode) -> Self {
        self.expect = expect;
        self
    }

    #[allow(unused)]
    pub fn with_save_cookies(mut self, save_cookies: bool) -> Self {
        self.save_cookies = save_cookies;
        self
    }

    pub fn with_clear_cookies(mut self, clear_cookies: bool) -> Self {
        self.clear_cookies = clear_cookies;
        self
    }

    #[allow(unused)]
    pub fn with_param(mut self, key: &str, val: &str) -> Self {
        self.query_params.push((String::from(key), String::from(val)));
        self
    }

    #[allow(unused)]
    pub fn with_dyn_path<F>(mut self, f: F) -> Self
    where
        F: Fn(&FlowContext) -> String + Send + Sync + 'static,
    {
        self.dyn_path = Some(Box::new(f));
        self
    }

    #[allow(unused)]
    pub fn with_save_as(mut self, key: &'static str) -> Self {
        self.save_as = Some(key);
        self
    }

    #[allow(unused)]
    pub fn assert_cookie<F>(mut self, name: &'static str, check: F) -> Self
    where
        F: Fn(&Cookie) + Send + Sync + 'static,
    {
        self.cookie_asserts.push((name, Box::new(check)));
        self
    }

    /// The response must not touch the cookie, neither set nor remove it.
    #[allow(unused)]
    pub fn assert_no_cookie(mut self, name: &'static str) -> Self {
        self.absent_cookies.push(name);
        self
    }

    #[allow(unused)]
    pub fn assert_header(mut self, name: &'static str, expected: &str) -> Self {
        self.header_asserts.push((name, expected.to_string()));
        self
    }

    /// Checks the JSON body, re-serialized to a string.
    #[allow(unused)]
    pub fn assert_body<F>(mut self, check: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.body_asserts.push(Box::new(check));
        self
    }

    /// Checks the raw body, for pages and static files.
    #[allow(unused)]
    pub fn assert_text<F>(mut self, check: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.text_asserts.push(Box::new(check));
        self
    }
}

pub struct Flow {
    actions: Vec<Action>,
}

impl Flow {
    pub fn new() -> Self {
        Self { actions: vec![] }
    }

    pub fn step(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub async fn run(self, server: &mut TestServer) -> FlowContext {
        let mut ctx = FlowContext::new(); // create new context for this flow
        for action in self.actions {
            println!("==> Running test action `{}`", action.name);
            if action.clear_cookies {
                server.clear_cookies();
            }

            if action.save_cookies {
                server.save_cookies();
            } else {
                server.do_not_save_cookies();
            }

            let path = if let Some(dyn_path_fn) = &action.dyn_path {
                dyn_path_fn(&ctx)
            } else {
                action.path.clone()
            };

            let mut req = match action.method {
                "GET" => server.get(&path),
                "POST" => server.post(&path),
                "PUT" => server.put(&path),
                "DELETE" => server.delete(&path),
                _ => panic!("unsupported method {}", action.method),
            };

            match (&action.form, action.body) {
                (Some(f), _) => req = req.multipart(f(&ctx)),
                (_, Some(json)) => req = req.json(&json),
                _ => {}
            }

            for (k, v) in action.query_params {
                req = req.add_query_param(&k, v);
            }

            let resp = req.await;
            resp.assert_status(action.expect);
            let cookies = resp.cookies();

            for (cookie_name, check) in action.cookie_asserts {
                let cookie = cookies
                    .get(cookie_name)
                    .unwrap_or_else(|| panic!("Cookie {} is not set", cookie_name));
                check(cookie);
            }

            for cookie_name in action.absent_cookies {
                assert!(
                    cookies.get(cookie_name).is_none(),
                    "Cookie {} should not be in the response",
                    cookie_name
                );
            }

            for (header, expected) in action.header_asserts {
                let value = resp.header(header);
                assert_eq!(value.to_str().unwrap(), expected, "header {header}");
            }

            if !action.text_asserts.is_empty() {
                let text = resp.text();
                for check in action.text_asserts {
                    check(&text);
                }
            }

            if !action.body_asserts.is_empty() {
                let body = resp.json::<Value>();
                let body = serde_json::to_string(&body)
                    .unwrap_or_else(|_| panic!("Unable to serialize body to string"));
                for check in action.body_asserts {
                    check(&body);
                }
            }

            if let Some(save_key) = action.save_as {
                let body = resp.json::<Value>();
                ctx.store(save_key, body);
            }
        }
        ctx
    }
}

// Common actions builders

pub fn signin_action(email: &str, password: &str) -> Action {
    Action::new("signin", "POST", "/api/v1/account/signin").with_body(json!({
        "email": email,
        "password": password,
    }))
}

#[allow(unused)]
pub fn signin_admin_action() -> Action {
    signin_action(ADMIN_EMAIL, ADMIN_PASSWORD).with_clear_cookies(true)
}

#[allow(unused)]
pub fn signin_student_action() -> Action {
    signin_action(STUDENT_EMAIL, STUDENT_PASSWORD).with_clear_cookies(true)
}

#[allow(unused)]
pub fn lesson_view_action(module: Option<Uuid>, lesson: Option<Uuid>) -> Action {
    let mut action = Action::new("lesson_view", "GET", "/api/v1/lesson");
    if let Some(module) = module {
        action = action.with_param("module", &module.to_string());
    }
    if let Some(lesson) = lesson {
        action = action.with_param("lesson", &lesson.to_string());
    }
    action
}
