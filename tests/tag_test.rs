mod common;

use serde_json::{json, Value};

#[tokio::test]
async fn tags_are_listed_once() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "tagger").await;

    common::create_test_blog(&app, &user, "PUBLIC").await;
    common::create_test_blog(&app, &user, "PUBLIC").await;

    let body: Value = app
        .client
        .get(app.url("/tags"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(names, vec!["rust"]);
}

#[tokio::test]
async fn blogs_by_tag_are_public_only() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "tagged").await;

    common::create_test_blog(&app, &user, "PUBLIC").await;
    common::create_test_blog(&app, &user, "ONLY_ME").await;

    let resp = app
        .client
        .post(app.url("/blogs"))
        .bearer_auth(&user.token)
        .json(&json!({
            "title": "Other",
            "content": "Untagged body",
            "images": ["/uploads/blogs/o.png"],
            "tags": ["other"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = app
        .client
        .get(app.url("/tags/RUST/blogs"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["tags"], json!(["rust"]));
}

#[tokio::test]
async fn unknown_tag_is_404() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/tags/nothing-here/blogs"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
