mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{caption_reply, no_caption_requests, render_client};
use llmeme::ai::config::GenerationConfig;
use llmeme::ai::providers::ScriptedModel;
use llmeme::meme::{
    Credentials, Event, EventLogger, EventStore, EventType, MemeContext, MemeError,
    MemeExample, MemeGenerator, MemoryEventStore, Session,
};
use mockito::ServerGuard;
use pretty_assertions::assert_eq;

const DRAKE: &str = r#"{"template_id": "181913649", "text0": "tabs", "text1": "spaces"}"#;
const BUTTONS: &str = r#"```json
{"template_id": "87743020", "text0": "ship it", "text1": "test it",}
```"#;
const SUCCESS: &str = r#"{"success": true, "data": {"url": "http://i.imgflip.com/1.jpg"}}"#;
const SUCCESS_2: &str = r#"{"success": true, "data": {"url": "http://i.imgflip.com/2.jpg"}}"#;
const DRAKE_ID: &str = "181913649";
const BUTTONS_ID: &str = "87743020";
const REJECTED: &str = r#"{"success": false, "error_message": "No texts specified."}"#;

struct BrokenStore;

#[async_trait]
impl EventStore for BrokenStore {
    async fn insert(&self, _event: &Event) -> anyhow::Result<String> {
        Err(anyhow::anyhow!("database is down"))
    }
}

fn context() -> MemeContext {
    MemeContext::new(vec![
        MemeExample::new("181913649", vec!["no".to_string(), "yes".to_string()]),
        MemeExample::new("87743020", vec!["left".to_string(), "right".to_string()]),
    ])
}

fn generator(
    model: ScriptedModel,
    server: &ServerGuard,
    store: Arc<dyn EventStore>,
) -> MemeGenerator {
    MemeGenerator::new(
        context(),
        Box::new(model),
        render_client(server),
        Credentials::new("user", "pass"),
        GenerationConfig {
            max_attempts: 3,
            ..Default::default()
        },
        EventLogger::new(store, "test"),
    )
    .unwrap()
}

#[tokio::test]
async fn generates_renders_and_logs() {
    let mut server = mockito::Server::new_async().await;
    let caption = caption_reply(&mut server, DRAKE_ID, SUCCESS, 1).await;
    let store = Arc::new(MemoryEventStore::new());
    let generator = generator(ScriptedModel::new(["", DRAKE]), &server, store.clone());
    let mut session = Session::new();

    let meme = generator
        .generate_meme(&mut session, "  code style debates ")
        .await
        .unwrap();

    assert_eq!(meme.image_url, "http://i.imgflip.com/1.jpg");
    assert_eq!(meme.attempt.template_id.as_deref(), Some("181913649"));
    assert_eq!(session.current_meme_url(), Some("http://i.imgflip.com/1.jpg"));
    assert!(session.previous_attempts().is_empty());

    let events = store.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::MemeCreated);
    assert_eq!(events[0].session_id, session.id);
    assert_eq!(events[0].data["template_id"], "181913649");
    assert_eq!(events[0].data["image_url"], "http://i.imgflip.com/1.jpg");
    assert!(events[0].metadata["client_timestamp"].is_string());
    caption.assert_async().await;
}

#[tokio::test]
async fn rejected_render_is_declined_and_fed_back() {
    let mut server = mockito::Server::new_async().await;
    let rejected = caption_reply(&mut server, DRAKE_ID, REJECTED, 1).await;
    let accepted = caption_reply(&mut server, BUTTONS_ID, SUCCESS, 1).await;
    let store = Arc::new(MemoryEventStore::new());
    let model = Arc::new(ScriptedModel::new([DRAKE, BUTTONS]));
    let generator = MemeGenerator::new(
        context(),
        Box::new(SharedModel(model.clone())),
        render_client(&server),
        Credentials::new("user", "pass"),
        GenerationConfig::default(),
        EventLogger::new(store.clone(), "test"),
    )
    .unwrap();
    let mut session = Session::new();

    let err = generator
        .generate_meme(&mut session, "deploys")
        .await
        .unwrap_err();
    assert!(matches!(err, MemeError::RenderRejected(ref message) if message == "No texts specified."));
    assert_eq!(session.previous_attempts().len(), 1);
    assert_eq!(session.current(), None);

    let meme = generator.generate_meme(&mut session, "deploys").await.unwrap();
    assert_eq!(meme.attempt.template_id.as_deref(), Some("87743020"));

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(!prompts[0].contains("DECLINED MEMES"));
    assert!(prompts[1].starts_with("DECLINED MEMES"));
    assert!(prompts[1].contains(&session.previous_attempts()[0].to_string()));

    let kinds = store
        .events()
        .iter()
        .map(|event| event.event_type)
        .collect::<Vec<EventType>>();
    assert_eq!(kinds, vec![EventType::Error, EventType::MemeCreated]);
    assert_eq!(store.events()[0].data["error_type"], "RenderRejected");
    rejected.assert_async().await;
    accepted.assert_async().await;
}

#[tokio::test]
async fn try_another_declines_the_current_meme() {
    let mut server = mockito::Server::new_async().await;
    let _first_caption = caption_reply(&mut server, DRAKE_ID, SUCCESS, 1).await;
    let _second_caption = caption_reply(&mut server, BUTTONS_ID, SUCCESS_2, 1).await;
    let store = Arc::new(MemoryEventStore::new());
    let generator = generator(ScriptedModel::new([DRAKE, BUTTONS]), &server, store.clone());
    let mut session = Session::new();

    let first = generator.generate_meme(&mut session, "deploys").await.unwrap();
    let second = generator.try_another(&mut session, "deploys").await.unwrap();

    assert_eq!(session.previous_attempts(), &[first.attempt]);
    assert_eq!(session.current_meme_url(), Some(second.image_url.as_str()));
}

#[tokio::test]
async fn exhausted_generation_is_logged_and_surfaced() {
    let mut server = mockito::Server::new_async().await;
    let caption = no_caption_requests(&mut server).await;
    let store = Arc::new(MemoryEventStore::new());
    let generator = generator(ScriptedModel::new(["I cannot do that"]), &server, store.clone());
    let mut session = Session::new();

    let err = generator
        .generate_meme(&mut session, "anything")
        .await
        .unwrap_err();

    assert!(matches!(err, MemeError::GenerationExhausted { attempts: 3, .. }));
    caption.assert_async().await;
    let events = store.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::Error);
    assert_eq!(events[0].data["error_type"], "GenerationExhausted");
    assert_eq!(events[0].data["prompt"], "anything");
}

#[tokio::test]
async fn blank_prompt_is_invalid_input() {
    let server = mockito::Server::new_async().await;
    let model = Arc::new(ScriptedModel::new([DRAKE]));
    let generator = MemeGenerator::new(
        context(),
        Box::new(SharedModel(model.clone())),
        render_client(&server),
        Credentials::default(),
        GenerationConfig::default(),
        EventLogger::new(Arc::new(MemoryEventStore::new()), "test"),
    )
    .unwrap();

    let err = generator
        .generate_meme(&mut Session::new(), "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, MemeError::InvalidInput(_)));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn event_store_failures_do_not_mask_results() {
    let mut server = mockito::Server::new_async().await;
    let _caption = caption_reply(&mut server, DRAKE_ID, SUCCESS, 1).await;
    let generator = generator(ScriptedModel::new([DRAKE]), &server, Arc::new(BrokenStore));
    let mut session = Session::new();

    assert_eq!(generator.log_startup(&session).await, None);
    let meme = generator.generate_meme(&mut session, "deploys").await.unwrap();
    assert_eq!(meme.image_url, "http://i.imgflip.com/1.jpg");
    assert!(generator.like_meme(&session).await.is_some());
}

#[tokio::test]
async fn like_requires_a_current_meme() {
    let mut server = mockito::Server::new_async().await;
    let _caption = caption_reply(&mut server, DRAKE_ID, SUCCESS, 1).await;
    let store = Arc::new(MemoryEventStore::new());
    let generator = generator(ScriptedModel::new([DRAKE]), &server, store.clone());
    let mut session = Session::new();

    assert_eq!(generator.like_meme(&session).await, None);
    assert!(store.events().is_empty());

    generator.generate_meme(&mut session, "deploys").await.unwrap();
    assert_eq!(
        generator.like_meme(&session).await,
        Some(llmeme::meme::pipeline::LIKE_RESPONSE)
    );

    let liked = store.events().pop().unwrap();
    assert_eq!(liked.event_type, EventType::MemeLiked);
    assert_eq!(liked.data["image_url"], "http://i.imgflip.com/1.jpg");
}

#[tokio::test]
async fn concurrent_sessions_keep_separate_histories() {
    let mut server = mockito::Server::new_async().await;
    let caption = caption_reply(&mut server, DRAKE_ID, REJECTED, 2).await;
    let generator = generator(
        ScriptedModel::new([DRAKE]),
        &server,
        Arc::new(MemoryEventStore::new()),
    );
    let mut first = Session::new();
    let mut second = Session::new();

    let (a, b) = futures::join!(
        generator.generate_meme(&mut first, "one"),
        generator.generate_meme(&mut second, "two"),
    );

    assert!(a.is_err() && b.is_err());
    assert_eq!(first.previous_attempts().len(), 1);
    assert_eq!(second.previous_attempts().len(), 1);
    caption.assert_async().await;
}

/// Lets a test keep a handle on the scripted model after handing it over.
struct SharedModel(Arc<ScriptedModel>);

#[async_trait]
impl llmeme::ai::completion::CompletionModel for SharedModel {
    async fn get_completion(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> anyhow::Result<String> {
        self.0.get_completion(prompt, config).await
    }

    fn get_display_name(&self) -> String {
        self.0.get_display_name()
    }
}
