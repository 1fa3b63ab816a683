use mockito::Matcher;
use travel_feed_tui::api::{ArticleService, ListQuery, NewPostsCheck};
use travel_feed_tui::internal::models::{ArticleScope, ArticleStatus, Watermark};
use travel_feed_tui::internal::pending::PendingSource;
use travel_feed_tui::internal::polling::CheckNewPosts;

#[tokio::test]
async fn test_integration_paginated_feed() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("GET", "/prod/articles")
        .match_query(Matcher::Exact("scope=public&limit=2".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "items": [
                    {"articleId": "a2", "title": "Sapa rice terraces", "status": "public", "createdAt": "2024-06-02T00:00:00Z"},
                    {"articleId": "a1", "title": "Hoi An lanterns", "status": "public", "createdAt": "2024-06-01T00:00:00Z"}
                ],
                "nextToken": "page-2"
            }"#,
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", "/prod/articles")
        .match_query(Matcher::Exact(
            "scope=public&limit=2&nextToken=page-2".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"items": [{"articleId": "a0", "title": "Hue citadel"}]}"#)
        .create_async()
        .await;

    let service = ArticleService::with_base_url(format!("{}/prod", server.url()));
    let query = ListQuery::first_page(ArticleScope::Public, 2);
    let page = service
        .list_articles(&query)
        .await
        .expect("Failed to fetch first page");
    assert_eq!(page.items.len(), 2);

    let token = page.next_token.expect("first page has a next token");
    let next = service
        .list_articles(&query.after(token))
        .await
        .expect("Failed to fetch second page");
    assert_eq!(next.items[0].article_id, "a0");
    assert_eq!(next.items[0].status, ArticleStatus::Public);
    assert!(next.next_token.is_none());

    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_integration_new_posts_check_is_uncached() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/articles")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"items": [
                {"articleId": "n1", "createdAt": "2024-06-03T00:00:00Z"},
                {"articleId": "a2", "createdAt": "2024-06-02T00:00:00Z"}
            ]}"#,
        )
        .expect(2)
        .create_async()
        .await;

    let check = NewPostsCheck::new(ArticleService::with_base_url(server.url()), 10);
    check.set_watermark(Some(Watermark {
        article_id: "a2".into(),
        created_at: Some("2024-06-02T00:00:00Z".parse().unwrap()),
    }));

    assert_eq!(check.check_new_posts().await.unwrap(), 1);
    assert_eq!(check.check_new_posts().await.unwrap(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_integration_unauthorized_list_mine() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/articles")
        .match_query(Matcher::UrlEncoded("scope".into(), "mine".into()))
        .with_status(401)
        .with_body(r#"{"message": "Unauthorized"}"#)
        .create_async()
        .await;

    let service = ArticleService::with_base_url(server.url());
    let err = service.list_mine().await.unwrap_err();
    assert!(format!("{:#}", err).contains("Unauthorized"));
}
