use std::sync::Arc;

use sqlx::SqlitePool;
use studygroup::client::{
    ApiClient, CreateGroupForm, GroupWorkflow, LogNotifier, LogPresence, LoginResult, SessionFlow,
    StateStore,
};
use studygroup::db::{self, repository};
use studygroup::models::{NewCourseRequest, RegisterRequest};
use studygroup::{api::router, auth::Authenticator, state::AppState};

async fn spawn_server() -> (String, SqlitePool) {
    let pool = db::connect_in_memory().await.expect("Failed to create test db");
    let app = router(AppState::new(pool.clone(), Authenticator::new("test-secret", 180)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (format!("http://{addr}"), pool)
}

struct Client {
    api: Arc<ApiClient>,
    store: StateStore,
    session: SessionFlow,
    groups: GroupWorkflow,
}

fn client(base_url: &str) -> Client {
    let api = Arc::new(ApiClient::new(base_url).expect("client"));
    let store = StateStore::default();
    Client {
        session: SessionFlow::new(api.clone(), store.clone()),
        groups: GroupWorkflow::new(
            api.clone(),
            Arc::new(LogPresence),
            Arc::new(LogNotifier),
            store.clone(),
        ),
        api,
        store,
    }
}

fn registration(email: &str, first: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: "pa55word".to_string(),
        first_name: first.to_string(),
        last_name: "Tester".to_string(),
    }
}

#[tokio::test]
async fn test_login_drives_session_state() {
    let (base_url, _pool) = spawn_server().await;
    let ada = client(&base_url);
    ada.session.register(&registration("ada@example.com", "Ada")).await.expect("register");

    let fresh = client(&base_url);
    assert_eq!(
        fresh.session.login("ada@example.com", "wrong").await,
        LoginResult::InvalidCredentials
    );
    assert!(fresh.store.snapshot().session.is_loading);
    assert!(!fresh.store.snapshot().session.is_authenticated);

    assert_eq!(
        fresh.session.login("nobody@example.com", "pa55word").await,
        LoginResult::NotFound
    );

    assert_eq!(fresh.session.login("ada@example.com", "pa55word").await, LoginResult::Success);
    let state = fresh.store.snapshot();
    assert!(state.session.is_authenticated);
    assert!(!state.session.is_loading);
    assert_eq!(state.profile.first_name, "Ada");

    fresh.session.logout().await;
    assert!(!fresh.store.snapshot().session.is_authenticated);
    assert!(!fresh.api.has_session());
}

#[tokio::test]
async fn test_group_workflow_against_server() {
    let (base_url, pool) = spawn_server().await;
    let ada = client(&base_url);
    let bob = client(&base_url);
    ada.session.register(&registration("ada@example.com", "Ada")).await.expect("register");
    bob.session.register(&registration("bob@example.com", "Bob")).await.expect("register");

    let course = repository::insert_course(&pool, NewCourseRequest { name: "Calculus".to_string() })
        .await
        .expect("course");
    for c in [&ada, &bob] {
        let user_id = c.store.snapshot().profile.user_id.clone();
        repository::enroll(&pool, &user_id, &course.id).await.expect("enroll");
        c.session.load_user().await.expect("reload");
        assert_eq!(c.store.snapshot().user_courses.len(), 1);
    }

    let created = ada
        .groups
        .create_group(CreateGroupForm {
            name: "Calc Study".to_string(),
            image_url: String::new(),
            course_id: Some(course.id.clone()),
        })
        .await
        .expect("create");
    assert_eq!(ada.store.snapshot().user_groups.groups.len(), 1);

    bob.groups.refresh().await.expect("refresh");
    let suggested = bob.groups.suggested_groups();
    assert_eq!(suggested.len(), 1);
    assert_eq!(suggested[0].id, created.id);
    assert!(!bob.groups.check_name("calc study").is_valid());

    let joined = bob.groups.join_group(&created.id).await.expect("join");
    assert_eq!(joined.members.len(), 2);
    assert!(bob.groups.suggested_groups().is_empty());

    let left = bob.groups.leave_group(&created.id).await.expect("leave");
    assert_eq!(left.members.len(), 1);
    let state = bob.store.snapshot();
    assert!(state.user_groups.groups.is_empty());
    assert_eq!(state.user_groups.course_groups[0].members.len(), 1);
    assert_eq!(bob.groups.suggested_groups().len(), 1);

    assert!(bob.groups.join_group("missing").await.is_err());
}
