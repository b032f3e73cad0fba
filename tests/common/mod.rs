#![allow(dead_code)]

use llmeme::meme::{RenderClient, RenderConfig};
use mockito::{Matcher, Mock, ServerGuard};

pub const CAPTION_PATH: &str = "/caption_image";

pub fn render_client(server: &ServerGuard) -> RenderClient {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    RenderClient::with_client(
        http,
        &RenderConfig {
            api_url: format!("{}{CAPTION_PATH}", server.url()),
            ..Default::default()
        },
    )
}

/// Answers caption requests for `template_id` with `body`, `hits` times.
pub async fn caption_reply(
    server: &mut ServerGuard,
    template_id: &str,
    body: &str,
    hits: usize,
) -> Mock {
    server
        .mock("POST", CAPTION_PATH)
        .match_body(Matcher::UrlEncoded(
            "template_id".to_string(),
            template_id.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}

/// Fails the test if any caption request arrives.
pub async fn no_caption_requests(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", CAPTION_PATH)
        .expect(0)
        .create_async()
        .await
}
