mod common;

use serde_json::{json, Value};

fn blog_body(images: Vec<&str>) -> Value {
    json!({
        "title": "Images",
        "content": "Some words for the body.",
        "images": images,
    })
}

#[tokio::test]
async fn create_fills_derived_fields() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "writer").await;

    let resp = app
        .client
        .post(app.url("/blogs"))
        .bearer_auth(&user.token)
        .json(&json!({
            "title": "  Hello world  ",
            "content": "# Heading\n\nFirst paragraph with **bold** text.\n\n<script>alert(1)</script>",
            "images": ["/uploads/blogs/a.png", "/uploads/blogs/b.png"],
            "tags": ["Rust", "rust", " web "]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(data["title"], "Hello world");
    assert_eq!(data["visibility"], "PUBLIC");
    assert_eq!(data["featured_image"], "/uploads/blogs/a.png");
    assert_eq!(data["images"].as_array().unwrap().len(), 2);
    assert_eq!(data["tags"], json!(["rust", "web"]));
    assert!(data["reading_time"].as_i64().unwrap() >= 1);
    assert!(!data["excerpt"].as_str().unwrap().is_empty());
    assert!(data["content_html"].as_str().unwrap().contains("<strong>bold</strong>"));
    assert!(!data["content_html"].as_str().unwrap().contains("<script>"));
}

#[tokio::test]
async fn image_count_must_be_one_to_five() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "imgcount").await;

    for (images, expected) in [
        (vec![], 400u16),
        (vec!["/a.png"], 200),
        (vec!["/a.png"; 5], 200),
        (vec!["/a.png"; 6], 400),
    ] {
        let resp = app
            .client
            .post(app.url("/blogs"))
            .bearer_auth(&user.token)
            .json(&blog_body(images.clone()))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), expected, "{} images", images.len());
    }
}

#[tokio::test]
async fn visibility_rules_apply_to_reads() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "author").await;
    let follower = common::create_test_user(&app, "follower").await;
    let stranger = common::create_test_user(&app, "stranger").await;

    let public = common::create_test_blog(&app, &author, "PUBLIC").await;
    let followers = common::create_test_blog(&app, &author, "FOLLOWERS").await;
    let private = common::create_test_blog(&app, &author, "ONLY_ME").await;

    app.client
        .post(app.url(&format!("/users/{}/follow", author.id)))
        .bearer_auth(&follower.token)
        .send()
        .await
        .unwrap();

    let status = |token: Option<String>, id: i32| {
        let app = &app;
        async move {
            let mut req = app.client.get(app.url(&format!("/blogs/{}", id)));
            if let Some(token) = token {
                req = req.bearer_auth(token);
            }
            req.send().await.unwrap().status().as_u16()
        }
    };

    assert_eq!(status(None, public).await, 200);
    assert_eq!(status(None, followers).await, 404);
    assert_eq!(status(None, private).await, 404);

    assert_eq!(status(Some(stranger.token.clone()), followers).await, 404);
    assert_eq!(status(Some(follower.token.clone()), followers).await, 200);
    assert_eq!(status(Some(follower.token.clone()), private).await, 404);

    assert_eq!(status(Some(author.token.clone()), private).await, 200);
}

#[tokio::test]
async fn author_listing_is_visibility_aware() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "lister").await;
    let reader = common::create_test_user(&app, "reader").await;

    common::create_test_blog(&app, &author, "PUBLIC").await;
    common::create_test_blog(&app, &author, "FOLLOWERS").await;
    common::create_test_blog(&app, &author, "ONLY_ME").await;

    let total = |token: Option<String>| {
        let app = &app;
        let author_id = author.id;
        async move {
            let mut req = app.client.get(app.url(&format!("/users/{}/blogs", author_id)));
            if let Some(token) = token {
                req = req.bearer_auth(token);
            }
            let body: Value = req.send().await.unwrap().json().await.unwrap();
            body["data"]["total"].as_u64().unwrap()
        }
    };

    assert_eq!(total(None).await, 1);
    assert_eq!(total(Some(reader.token.clone())).await, 1);
    assert_eq!(total(Some(author.token.clone())).await, 3);

    app.client
        .post(app.url(&format!("/users/{}/follow", author.id)))
        .bearer_auth(&reader.token)
        .send()
        .await
        .unwrap();
    assert_eq!(total(Some(reader.token.clone())).await, 2);
}

#[tokio::test]
async fn feed_lists_public_blogs_only() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "feed").await;

    common::create_test_blog(&app, &author, "PUBLIC").await;
    common::create_test_blog(&app, &author, "FOLLOWERS").await;

    let body: Value = app
        .client
        .get(app.url("/blogs"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["visibility"], "PUBLIC");
    assert_eq!(items[0]["tags"], json!(["rust"]));
}

#[tokio::test]
async fn only_the_author_can_update_or_delete() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "owner").await;
    let other = common::create_test_user(&app, "intruder").await;
    let id = common::create_test_blog(&app, &author, "PUBLIC").await;

    let update = json!({
        "title": "Edited",
        "content": "New body",
        "visibility": "FOLLOWERS",
        "images": ["/uploads/blogs/x.png"],
        "tags": ["edited"]
    });

    let resp = app
        .client
        .put(app.url(&format!("/blogs/{}", id)))
        .bearer_auth(&other.token)
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .put(app.url(&format!("/blogs/{}", id)))
        .bearer_auth(&author.token)
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Edited");
    assert_eq!(body["data"]["visibility"], "FOLLOWERS");
    assert_eq!(body["data"]["images"], json!(["/uploads/blogs/x.png"]));
    assert_eq!(body["data"]["tags"], json!(["edited"]));

    let resp = app
        .client
        .delete(app.url(&format!("/blogs/{}", id)))
        .bearer_auth(&other.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .delete(app.url(&format!("/blogs/{}", id)))
        .bearer_auth(&author.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/blogs/{}", id)))
        .bearer_auth(&author.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn likes_and_favorites_toggle() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "liked").await;
    let fan = common::create_test_user(&app, "liker").await;
    let id = common::create_test_blog(&app, &author, "PUBLIC").await;

    let toggle = |path: &'static str| {
        let app = &app;
        let token = fan.token.clone();
        async move {
            let body: Value = app
                .client
                .post(app.url(&format!("/blogs/{}/{}", id, path)))
                .bearer_auth(token)
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            body
        }
    };

    assert_eq!(toggle("like").await["data"]["liked"], true);
    assert_eq!(toggle("favorite").await["data"]["favorited"], true);

    let body: Value = app
        .client
        .get(app.url(&format!("/blogs/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["like_count"], 1);
    assert_eq!(body["data"]["favorite_count"], 1);

    let body: Value = app
        .client
        .get(app.url("/favorites"))
        .bearer_auth(&fan.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["total"], 1);

    assert_eq!(toggle("like").await["data"]["liked"], false);
    assert_eq!(toggle("favorite").await["data"]["favorited"], false);
}

#[tokio::test]
async fn cannot_react_to_hidden_blogs() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "hidden").await;
    let other = common::create_test_user(&app, "peeker").await;
    let id = common::create_test_blog(&app, &author, "ONLY_ME").await;

    let resp = app
        .client
        .post(app.url(&format!("/blogs/{}/like", id)))
        .bearer_auth(&other.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
