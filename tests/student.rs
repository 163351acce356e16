mod common;
use axum::http::StatusCode;
use mestre::backend::{Backend, Collection, Query};
use serde_json::Value;

use crate::common::{
    Action, Flow, json_body, lesson_view_action, setup_fixture, setup_server,
    signin_admin_action, signin_student_action,
};

#[tokio::test]
async fn route_member_area_test() {
    let fixture = setup_fixture();
    let mut server = setup_server(&fixture).await;
    let seed = fixture.seed;

    Flow::new()
        .step(
            Action::new("modules_anonymous", "GET", "/api/v1/modules/")
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(signin_student_action())
        .step(
            Action::new("modules", "GET", "/api/v1/modules/").assert_body(move |body| {
                let body = json_body(body);
                assert_eq!(body["user_name"], "joao.silva");

                let modules = body["modules"].as_array().expect("modules is not a list");
                let labels: Vec<_> = modules.iter().map(|m| m["label"].clone()).collect();
                assert_eq!(labels, ["Module 01", "Module 02", "Module 03"]);

                assert_eq!(modules[0]["id"], seed.intro.to_string());
                assert_eq!(modules[0]["href"], format!("/lesson?module={}", seed.intro));
                assert_eq!(modules[0]["image_url"], "https://img.example.com/1.jpg");

                assert_eq!(modules[2]["id"], seed.vault.to_string());
                assert_eq!(modules[2]["is_locked"], true);
                assert_eq!(modules[2]["href"], Value::Null);
            }),
        )
        .run(&mut server)
        .await;
}

#[tokio::test]
async fn route_lesson_player_defaults_test() {
    let fixture = setup_fixture();
    let mut server = setup_server(&fixture).await;
    let seed = fixture.seed;

    Flow::new()
        .step(lesson_view_action(None, None).with_expect(StatusCode::UNAUTHORIZED))
        .step(signin_student_action())
        // no query, first module and its first lesson
        .step(lesson_view_action(None, None).assert_body(move |body| {
            let body = json_body(body);
            assert_eq!(body["active_module"], seed.intro.to_string());
            assert_eq!(body["query"]["module"], seed.intro.to_string());
            assert_eq!(body["query"]["lesson"], seed.intro_welcome.to_string());
            assert_eq!(
                body["location"],
                format!("/lesson?module={}&lesson={}", seed.intro, seed.intro_welcome)
            );

            let lesson = &body["active_lesson"];
            assert_eq!(lesson["title"], "Welcome");
            assert_eq!(lesson["player"]["kind"], "frame");
            assert_eq!(lesson["player"]["src"], "https://www.youtube.com/embed/abc123");

            let lessons = body["lessons"].as_array().unwrap();
            let titles: Vec<_> = lessons.iter().map(|l| l["title"].clone()).collect();
            assert_eq!(titles, ["Welcome", "Tools"]);
            assert_eq!(lessons[0]["active"], true);
            assert_eq!(lessons[1]["active"], false);

            assert!(
                body["avatar_url"]
                    .as_str()
                    .unwrap()
                    .starts_with("https://ui-avatars.com/api/?name=joao.silva")
            );
        }))
        .run(&mut server)
        .await;
}

#[tokio::test]
async fn route_lesson_player_query_sync_test() {
    let fixture = setup_fixture();
    let mut server = setup_server(&fixture).await;
    let seed = fixture.seed;

    Flow::new()
        .step(signin_student_action())
        // selecting a lesson
        .step(
            lesson_view_action(Some(seed.intro), Some(seed.intro_tools))
                .with_save_as("tools")
                .assert_body(move |body| {
                    let body = json_body(body);
                    assert_eq!(body["query"]["lesson"], seed.intro_tools.to_string());
                    assert_eq!(
                        body["active_lesson"]["player"]["src"],
                        "https://player.vimeo.com/video/76979871"
                    );
                }),
        )
        // reloading with the returned query reproduces the selection
        .step(
            Action::new("reload", "GET", "/api/v1/lesson")
                .with_dyn_path(|ctx| {
                    let location = ctx.get("tools")["location"].as_str().unwrap();
                    location.replacen("/lesson", "/api/v1/lesson", 1)
                })
                .assert_body(move |body| {
                    let body = json_body(body);
                    assert_eq!(body["active_module"], seed.intro.to_string());
                    assert_eq!(body["active_lesson"]["id"], seed.intro_tools.to_string());
                }),
        )
        // selecting another module auto-selects its first lesson
        .step(
            lesson_view_action(Some(seed.advanced), None).assert_body(move |body| {
                let body = json_body(body);
                assert_eq!(body["active_module"], seed.advanced.to_string());
                assert_eq!(body["query"]["lesson"], seed.advanced_drive.to_string());

                let modules = body["modules"].as_array().unwrap();
                assert_eq!(modules[0]["active"], false);
                assert_eq!(modules[1]["active"], true);

                let lesson = &body["active_lesson"];
                assert_eq!(lesson["player"]["kind"], "external");
                let kinds: Vec<_> = lesson["materials"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|m| m["kind"].clone())
                    .collect();
                assert_eq!(kinds, ["drive"]);
            }),
        )
        .run(&mut server)
        .await;
}

#[tokio::test]
async fn route_lesson_player_stale_params_test() {
    let fixture = setup_fixture();
    let mut server = setup_server(&fixture).await;
    let seed = fixture.seed;
    let unknown = uuid::Uuid::new_v4();

    Flow::new()
        .step(signin_student_action())
        // unknown module and lesson fall back to the first ones
        .step(
            lesson_view_action(Some(unknown), Some(unknown)).assert_body(move |body| {
                let body = json_body(body);
                assert_eq!(body["active_module"], seed.intro.to_string());
                assert_eq!(body["active_lesson"]["id"], seed.intro_welcome.to_string());
            }),
        )
        // a lesson of another module is not selectable here
        .step(
            lesson_view_action(Some(seed.intro), Some(seed.advanced_drive)).assert_body(
                move |body| {
                    let body = json_body(body);
                    assert_eq!(body["active_lesson"]["id"], seed.intro_welcome.to_string());
                },
            ),
        )
        // garbage ids are ignored
        .step(
            Action::new("garbage", "GET", "/api/v1/lesson")
                .with_param("module", "not-a-uuid")
                .with_param("lesson", "")
                .assert_body(move |body| {
                    let body = json_body(body);
                    assert_eq!(body["active_module"], seed.intro.to_string());
                }),
        )
        .run(&mut server)
        .await;
}

#[tokio::test]
async fn route_lesson_player_locked_module_test() {
    let fixture = setup_fixture();
    let mut server = setup_server(&fixture).await;
    let seed = fixture.seed;

    Flow::new()
        .step(signin_student_action())
        // a student naming the locked module lands on the first open one
        .step(
            lesson_view_action(Some(seed.vault), Some(seed.vault_secret)).assert_body(
                move |body| {
                    let body = json_body(body);
                    assert_eq!(body["active_module"], seed.intro.to_string());
                    assert!(!body.to_string().contains(&seed.vault_secret.to_string()));

                    let vault = &body["modules"][2];
                    assert_eq!(vault["is_locked"], true);
                    assert_eq!(vault["href"], Value::Null);
                },
            ),
        )
        // admins may open it
        .step(signin_admin_action())
        .step(
            lesson_view_action(Some(seed.vault), None).assert_body(move |body| {
                let body = json_body(body);
                assert_eq!(body["active_module"], seed.vault.to_string());
                assert_eq!(body["active_lesson"]["id"], seed.vault_secret.to_string());
                assert_eq!(
                    body["active_lesson"]["player"]["src"],
                    "https://www.youtube.com/embed/zzz"
                );
            }),
        )
        .run(&mut server)
        .await;
}

#[tokio::test]
async fn route_lesson_player_empty_course_test() {
    let fixture = setup_fixture();
    let mut server = setup_server(&fixture).await;

    fixture
        .backend
        .delete("", &Query::from(Collection::Modules))
        .await
        .unwrap();

    Flow::new()
        .step(signin_student_action())
        .step(lesson_view_action(None, None).assert_body(|body| {
            let body = json_body(body);
            assert_eq!(body["active_module"], Value::Null);
            assert_eq!(body["active_lesson"], Value::Null);
            assert_eq!(body["lessons"], serde_json::json!([]));
            assert_eq!(body["location"], "/lesson");
        }))
        .run(&mut server)
        .await;
}
