use reqwest::Url;

/// Web page for a post: `{web_base_url}/posts/{article_id}`.
/// Returns `None` when the base is not a valid absolute URL.
pub fn post_url(web_base_url: &str, article_id: &str) -> Option<String> {
    let mut url = Url::parse(web_base_url.trim()).ok()?;
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(["posts", article_id]);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_url_joins_segments() {
        assert_eq!(
            post_url("https://travel.example.com/", "a-1").as_deref(),
            Some("https://travel.example.com/posts/a-1")
        );
        assert_eq!(
            post_url("https://travel.example.com/app", "a 1").as_deref(),
            Some("https://travel.example.com/app/posts/a%201")
        );
    }

    #[test]
    fn test_post_url_rejects_relative_base() {
        assert_eq!(post_url("travel.example.com", "a-1"), None);
        assert_eq!(post_url("", "a-1"), None);
    }
}
