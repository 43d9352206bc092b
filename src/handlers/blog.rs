use crate::handlers::{AppState, credential};
use crate::models::blog::{LoginRequest, PostInput};
use crate::services::blog::BlogError;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use serde_json::json;

type HandlerResult = Result<HttpResponse, BlogError>;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn list_posts(data: web::Data<AppState>) -> HandlerResult {
    let posts = data.blog.list().await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn get_post(path: web::Path<String>, data: web::Data<AppState>) -> HandlerResult {
    let post = data.blog.get(&path).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn create_post(req: HttpRequest, body: web::Json<PostInput>, data: web::Data<AppState>) -> HandlerResult {
    let post = data.blog.create(credential(&req), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(post))
}

pub async fn update_post(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<PostInput>,
    data: web::Data<AppState>,
) -> HandlerResult {
    let post = data.blog.update(credential(&req), &path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete_post(req: HttpRequest, path: web::Path<String>, data: web::Data<AppState>) -> HandlerResult {
    data.blog.delete(credential(&req), &path).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Post deleted successfully" })))
}

pub async fn login(body: web::Json<LoginRequest>, data: web::Data<AppState>) -> HandlerResult {
    data.blog.login(&body.secret)?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

pub async fn get_views(data: web::Data<AppState>) -> HandlerResult {
    Ok(HttpResponse::Ok().json(data.blog.view_count().await?))
}

pub async fn increment_views(data: web::Data<AppState>) -> HandlerResult {
    Ok(HttpResponse::Ok().json(data.blog.increment_views().await?))
}

#[cfg(test)]
mod tests {
    use crate::handlers::{configure, testing};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::{Value, json};

    fn bearer(secret: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", secret))
    }

    #[actix_web::test]
    async fn create_with_secret_returns_201() {
        let state = testing::state("http://127.0.0.1:9").await;
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(testing::ADMIN_SECRET))
            .set_json(json!({ "title": "Hello", "content": "World" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let post: Value = test::read_body_json(resp).await;
        assert_eq!(post["title"], "Hello");
        assert_eq!(post["content"], "World");
        assert_eq!(post["images"], json!([]));
        assert_eq!(post["videos"], json!([]));
        assert_eq!(post["tags"], json!([]));
        assert!(post["date"].is_string());

        let id = post["_id"].as_str().unwrap();
        let req = test::TestRequest::get().uri(&format!("/api/posts/{}", id)).to_request();
        let fetched: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched, post);
    }

    #[actix_web::test]
    async fn unknown_post_is_404() {
        let state = testing::state("http://127.0.0.1:9").await;
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/posts/doesnotexist").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Post not found" }));
    }

    #[actix_web::test]
    async fn mutations_without_the_secret_are_401_and_change_nothing() {
        let state = testing::state("http://127.0.0.1:9").await;
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(testing::ADMIN_SECRET))
            .set_json(json!({ "title": "Original", "content": "text" }))
            .to_request();
        let original: Value = test::call_and_read_body_json(&app, req).await;
        let id = original["_id"].as_str().unwrap().to_string();

        let attempts = vec![
            test::TestRequest::post()
                .uri("/api/posts")
                .set_json(json!({ "title": "x", "content": "y" })),
            test::TestRequest::post()
                .uri("/api/posts")
                .insert_header(bearer("wrong"))
                .set_json(json!({ "title": "x", "content": "y" })),
            test::TestRequest::put()
                .uri(&format!("/api/posts/{}", id))
                .insert_header(bearer("wrong"))
                .set_json(json!({ "title": "x", "content": "y" })),
            test::TestRequest::delete()
                .uri(&format!("/api/posts/{}", id)),
            test::TestRequest::delete()
                .uri(&format!("/api/posts/{}", id))
                .insert_header(("Authorization", testing::ADMIN_SECRET)),
        ];
        for attempt in attempts {
            let resp = test::call_service(&app, attempt.to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({ "error": "Unauthorized" }));
        }

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let posts: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(posts, json!([original]));
    }

    #[actix_web::test]
    async fn update_and_delete_flow() {
        let state = testing::state("http://127.0.0.1:9").await;
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(testing::ADMIN_SECRET))
            .set_json(json!({ "title": "Draft", "content": "v1", "tags": ["a"] }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let uri = format!("/api/posts/{}", created["_id"].as_str().unwrap());

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(testing::ADMIN_SECRET))
            .set_json(json!({ "title": "Final", "content": "v2" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let updated: Value = test::read_body_json(resp).await;
        assert_eq!(updated["title"], "Final");
        assert_eq!(updated["tags"], json!([]));
        assert_eq!(updated["date"], created["date"]);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(testing::ADMIN_SECRET))
            .set_json(json!({ "title": "", "content": "v3" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Title is required" }));

        let req = test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(testing::ADMIN_SECRET))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "message": "Post deleted successfully" }));

        let req = test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(testing::ADMIN_SECRET))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn malformed_json_is_400() {
        let state = testing::state("http://127.0.0.1:9").await;
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(testing::ADMIN_SECRET))
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn login_checks_the_shared_secret() {
        let state = testing::state("http://127.0.0.1:9").await;
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/admin/login")
            .set_json(json!({ "secret": testing::ADMIN_SECRET }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "success": true }));

        let req = test::TestRequest::post()
            .uri("/api/admin/login")
            .set_json(json!({ "secret": "guess" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Invalid credentials" }));
    }

    #[actix_web::test]
    async fn views_increment_sequentially() {
        let state = testing::state("http://127.0.0.1:9").await;
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let get = || test::TestRequest::get().uri("/api/views").to_request();
        let post = || test::TestRequest::post().uri("/api/views").to_request();

        let body: Value = test::call_and_read_body_json(&app, get()).await;
        assert_eq!(body, json!({ "count": 0 }));

        let body: Value = test::call_and_read_body_json(&app, post()).await;
        assert_eq!(body, json!({ "count": 1 }));
        let body: Value = test::call_and_read_body_json(&app, post()).await;
        assert_eq!(body, json!({ "count": 2 }));

        let first: Value = test::call_and_read_body_json(&app, get()).await;
        let second: Value = test::call_and_read_body_json(&app, get()).await;
        assert_eq!(first, json!({ "count": 2 }));
        assert_eq!(first, second);
    }

    #[actix_web::test]
    async fn health_reports_ok() {
        let state = testing::state("http://127.0.0.1:9").await;
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].is_string());
    }
}
