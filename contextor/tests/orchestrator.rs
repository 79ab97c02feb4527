use std::{
    collections::VecDeque,
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use ai_llm_service::{
    AiLlmError, CompletionClient, CompletionProfile,
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    service_profiles::LlmServiceProfiles,
};
use async_trait::async_trait;
use chat_log::{ChatLogError, Interaction, InteractionLogger, InteractionStatus};
use context_store::{ContextBackend, ContextStore, DocumentContext, StoreError};
use contextor::{AnswerOutcome, ChatOrchestrator, ContextorConfig, Strategy};
use document_source::{
    BuildFailure, BuildFailureKind, ContextSource, HttpDocumentSource, TextExtractor,
};
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GUIDE: &str = "Bienvenida a la institución.\n\n\
    Horarios de atención de lunes a viernes.\n\n\
    Las becas se solicitan en bienestar estudiantil.\n\n\
    Reglamento de evaluación y notas.";

/* ---------------------------------------------------------------- doubles */

/// In-memory document source with a call counter.
struct StaticSource {
    calls: AtomicUsize,
    text: &'static str,
}

impl StaticSource {
    fn new(text: &'static str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            text,
        })
    }
}

#[async_trait]
impl ContextSource for StaticSource {
    async fn build_context(&self, url: &str) -> document_source::errors::Result<DocumentContext> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DocumentContext::new(self.text, url))
    }
}

/// Returns the file content as text.
struct EchoExtractor;

impl TextExtractor for EchoExtractor {
    fn extract(&self, path: &Path) -> document_source::errors::Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Scripted completion client recording every call.
#[derive(Default)]
struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, AiLlmError>>>,
    calls: Mutex<Vec<(String, String, CompletionProfile)>>,
}

impl ScriptedLlm {
    fn answering(text: &str) -> Arc<Self> {
        Self::script((0..8).map(|_| Ok(text.to_string())).collect())
    }

    fn script(replies: Vec<Result<String, AiLlmError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::default(),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedLlm {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        profile: CompletionProfile,
    ) -> Result<String, AiLlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string(), profile));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("sin guion".to_string()))
    }
}

/// Forwards every interaction to a channel.
struct ChannelLog(mpsc::UnboundedSender<Interaction>);

#[async_trait]
impl InteractionLogger for ChannelLog {
    fn backend(&self) -> &'static str {
        "channel"
    }

    async fn record(&self, interaction: Interaction) -> Result<(), ChatLogError> {
        let _ = self.0.send(interaction);
        Ok(())
    }
}

struct FailingLog;

#[async_trait]
impl InteractionLogger for FailingLog {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn record(&self, _: Interaction) -> Result<(), ChatLogError> {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        Err(ChatLogError::Json(err))
    }
}

/// Cache backend that is always down.
struct DownCache;

#[async_trait]
impl ContextBackend for DownCache {
    fn name(&self) -> &'static str {
        "down"
    }
    async fn get_raw(&self, _: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn put_raw(&self, _: &str, _: String, _: Duration) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn delete(&self, _: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/* ---------------------------------------------------------------- helpers */

fn config(strategy: Strategy) -> ContextorConfig {
    ContextorConfig {
        document_url: "https://docs.example/guia.pdf".into(),
        strategy,
        relevance_budget: 2_000,
        chunk_max_chars: 40,
        ..ContextorConfig::default()
    }
}

fn orchestrator(
    cfg: ContextorConfig,
    store: ContextStore,
    source: Arc<dyn ContextSource>,
    llm: Arc<dyn CompletionClient>,
) -> (ChatOrchestrator, mpsc::UnboundedReceiver<Interaction>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let chat = ChatOrchestrator::new(cfg, store, source, llm, Arc::new(ChannelLog(tx)));
    (chat, rx)
}

async fn next_log(rx: &mut mpsc::UnboundedReceiver<Interaction>) -> Interaction {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("interaction logged in time")
        .expect("log channel open")
}

/* ------------------------------------------------------------------ tests */

#[tokio::test]
async fn context_is_built_once_per_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/guia.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(GUIDE.as_bytes()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpDocumentSource::with_extractor(Duration::from_secs(5), Arc::new(EchoExtractor))
        .unwrap();
    let cfg = ContextorConfig {
        document_url: format!("{}/guia.pdf", server.uri()),
        ..config(Strategy::Relevance)
    };
    let llm = ScriptedLlm::answering("Las becas se solicitan en bienestar.");
    let (chat, mut logs) = orchestrator(cfg, ContextStore::in_memory(), Arc::new(source), llm.clone());

    let first = chat.ask("¿Dónde solicito becas?", Some("s-1")).await;
    let second = chat.ask("¿Y los horarios?", Some("s-1")).await;

    assert_eq!(first.session_id, "s-1");
    assert!(first.context_loaded);
    assert!(!second.context_loaded);
    assert!(first.outcome.is_answered() && second.outcome.is_answered());
    assert_eq!(llm.call_count(), 2);

    let mut logged = vec![next_log(&mut logs).await, next_log(&mut logs).await];
    logged.sort_by_key(|i| i.document.is_none());
    assert!(logged.iter().all(|i| i.status == InteractionStatus::Success));
    assert_eq!(logged[0].document.as_ref().unwrap().length, GUIDE.len());
    assert_eq!(logged[0].metadata["context_loaded"], true);
    assert!(logged[1].document.is_none());
    assert_eq!(logged[1].metadata["context_loaded"], false);
    // `expect(1)` on the mock is verified when the server drops.
}

#[tokio::test]
async fn different_sessions_own_their_contexts() {
    let source = StaticSource::new(GUIDE);
    let (chat, _logs) = orchestrator(
        config(Strategy::Relevance),
        ContextStore::in_memory(),
        source.clone(),
        ScriptedLlm::answering("ok"),
    );

    chat.ask("becas", Some("a")).await;
    chat.ask("becas", Some("b")).await;
    chat.ask("becas", Some("a")).await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn html_document_short_circuits_before_completion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=UTF-8")
                .set_body_string("<html></html>"),
        )
        .mount(&server)
        .await;

    let cfg = ContextorConfig {
        document_url: format!("{}/guia.pdf", server.uri()),
        ..config(Strategy::Relevance)
    };
    let source = HttpDocumentSource::with_extractor(Duration::from_secs(5), Arc::new(EchoExtractor))
        .unwrap();
    let llm = ScriptedLlm::answering("nunca");
    let (chat, mut logs) = orchestrator(cfg, ContextStore::in_memory(), Arc::new(source), llm.clone());

    let reply = chat.ask("¿Becas?", None).await;

    assert_eq!(llm.call_count(), 0);
    assert!(!reply.context_loaded);
    match &reply.outcome {
        AnswerOutcome::DocumentUnavailable { kind, .. } => {
            assert_eq!(*kind, BuildFailureKind::InvalidContentType)
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(reply.outcome.text().contains("No se pudo procesar el documento predefinido"));
    assert_eq!(next_log(&mut logs).await.status, InteractionStatus::Error);
}

#[tokio::test]
async fn rate_limited_completion_is_rendered_as_an_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {"message": "Too many requests", "type": "rate_limit_error", "code": 429}
        })))
        .mount(&server)
        .await;

    let profile = LlmModelConfig {
        provider: LlmProvider::DeepSeek,
        model: "deepseek-chat".into(),
        endpoint: server.uri(),
        api_key: Some("test-key".into()),
        max_tokens: Some(1500),
        temperature: Some(0.3),
        top_p: None,
        timeout_secs: Some(5),
    };
    let llm = Arc::new(LlmServiceProfiles::new(profile.clone(), profile));
    let (chat, _logs) = orchestrator(
        config(Strategy::Relevance),
        ContextStore::in_memory(),
        StaticSource::new(GUIDE),
        llm,
    );

    let reply = chat.ask("¿Becas?", Some("s-429")).await;

    match &reply.outcome {
        AnswerOutcome::CompletionFailed { status, kind, .. } => {
            assert_eq!(*status, Some(429));
            assert_eq!(*kind, "http_status");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    let text = reply.outcome.text();
    assert!(text.contains("Error de la API"));
    assert!(text.contains("HTTP 429"));
    assert!(text.contains("rate_limit_error"));
    assert!(text.contains("Too many requests"));
}

#[tokio::test]
async fn missing_session_id_gets_a_generated_token() {
    let (chat, _logs) = orchestrator(
        config(Strategy::Relevance),
        ContextStore::in_memory(),
        StaticSource::new(GUIDE),
        ScriptedLlm::answering("ok"),
    );

    let reply = chat.ask("becas", None).await;
    let suffix = reply.session_id.strip_prefix("session_").unwrap();
    assert_eq!(suffix.len(), 10);
    assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    assert!(chat.describe_session(&reply.session_id).await.context_cached);
}

#[tokio::test]
async fn relevance_strategy_sends_excerpt_with_excerpt_profile() {
    let llm = ScriptedLlm::answering("ok");
    let (chat, _logs) = orchestrator(
        config(Strategy::Relevance),
        ContextStore::in_memory(),
        StaticSource::new(GUIDE),
        llm.clone(),
    );

    let reply = chat.ask("¿Dónde solicito las becas?", Some("s")).await;

    let calls = llm.calls.lock().unwrap();
    let (system, user, profile) = &calls[0];
    assert_eq!(*profile, CompletionProfile::Excerpt);
    assert_eq!(user, "¿Dónde solicito las becas?");
    assert!(system.contains("SECCIONES RELEVANTES DEL DOCUMENTO"));
    assert!(system.contains("Las becas se solicitan en bienestar estudiantil."));
    let stats = reply.excerpt.unwrap();
    assert_eq!(stats.matched_sections, 1);
    assert!(stats.chars <= 2_000);
}

#[tokio::test]
async fn full_document_strategy_uses_full_profile() {
    let llm = ScriptedLlm::answering("ok");
    let (chat, _logs) = orchestrator(
        config(Strategy::FullDocument),
        ContextStore::in_memory(),
        StaticSource::new(GUIDE),
        llm.clone(),
    );

    let reply = chat.ask("becas", Some("s")).await;

    assert!(reply.excerpt.is_none());
    let calls = llm.calls.lock().unwrap();
    assert_eq!(calls[0].2, CompletionProfile::Full);
    assert!(calls[0].0.contains(GUIDE));
}

#[tokio::test]
async fn chunk_scan_stops_at_first_real_answer() {
    let cfg = config(Strategy::ChunkScan);
    let refusal = cfg.persona().refusal_sentence();
    let llm = ScriptedLlm::script(vec![
        Ok(refusal.clone()),
        Err(AiLlmError::Timeout(Duration::from_secs(60))),
        Ok("En bienestar estudiantil.".into()),
        Ok("no debería llegar".into()),
    ]);
    let (chat, _logs) = orchestrator(
        cfg,
        ContextStore::in_memory(),
        StaticSource::new(GUIDE),
        llm.clone(),
    );

    let reply = chat.ask("becas", Some("s")).await;

    assert_eq!(reply.outcome.text(), "En bienestar estudiantil.");
    assert_eq!(llm.call_count(), 3);
    let calls = llm.calls.lock().unwrap();
    assert!(calls.iter().all(|(_, _, p)| *p == CompletionProfile::Excerpt));
    assert!(calls[0].1.contains("(fragmento 1 de "));
    assert!(calls[2].1.contains("(fragmento 3 de "));
}

#[tokio::test]
async fn chunk_scan_without_answer_returns_refusal() {
    let cfg = config(Strategy::ChunkScan);
    let refusal = cfg.persona().refusal_sentence();
    let llm = ScriptedLlm::script((0..16).map(|_| Ok(format!("'{refusal}.'"))).collect());
    let (chat, _logs) = orchestrator(
        cfg,
        ContextStore::in_memory(),
        StaticSource::new(GUIDE),
        llm.clone(),
    );

    let reply = chat.ask("calendario", Some("s")).await;

    assert_eq!(reply.outcome, AnswerOutcome::Answered { text: refusal });
    let chunks = contextor::chunk::split_into_chunks(GUIDE, 40).len();
    assert_eq!(llm.call_count(), chunks);
}

#[tokio::test]
async fn cache_outage_degrades_to_rebuilding() {
    let source = StaticSource::new(GUIDE);
    let store = ContextStore::new(Arc::new(DownCache), Duration::from_secs(7200));
    let (chat, _logs) = orchestrator(
        config(Strategy::Relevance),
        store,
        source.clone(),
        ScriptedLlm::answering("ok"),
    );

    let a = chat.ask("becas", Some("s")).await;
    let b = chat.ask("becas", Some("s")).await;

    assert!(a.outcome.is_answered() && b.outcome.is_answered());
    assert!(a.context_loaded && b.context_loaded);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    assert!(!chat.clear_session("s").await);
}

#[tokio::test]
async fn failing_logger_does_not_touch_the_reply() {
    let chat = ChatOrchestrator::new(
        config(Strategy::Relevance),
        ContextStore::in_memory(),
        StaticSource::new(GUIDE),
        ScriptedLlm::answering("Respuesta"),
        Arc::new(FailingLog),
    );

    let reply = chat.ask("becas", Some("s")).await;
    tokio::task::yield_now().await;

    assert_eq!(reply.outcome.text(), "Respuesta");
}

#[tokio::test]
async fn clearing_sessions_is_idempotent() {
    let source = StaticSource::new(GUIDE);
    let (chat, _logs) = orchestrator(
        config(Strategy::Relevance),
        ContextStore::in_memory(),
        source.clone(),
        ScriptedLlm::answering("ok"),
    );

    assert!(!chat.clear_session("never-seen").await);
    chat.ask("becas", Some("s")).await;
    assert!(chat.clear_session("s").await);
    assert!(!chat.clear_session("s").await);

    let again = chat.ask("becas", Some("s")).await;
    assert!(again.context_loaded);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn fetch_failure_is_reported_as_document_unavailable() {
    struct Unreachable;

    #[async_trait]
    impl ContextSource for Unreachable {
        async fn build_context(&self, url: &str) -> document_source::errors::Result<DocumentContext> {
            Err(BuildFailure::Fetch {
                url: url.into(),
                status: Some(503),
                reason: "HTTP 503".into(),
            })
        }
    }

    let llm = ScriptedLlm::answering("nunca");
    let (chat, _logs) = orchestrator(
        config(Strategy::FullDocument),
        ContextStore::in_memory(),
        Arc::new(Unreachable),
        llm.clone(),
    );

    let reply = chat.ask("becas", Some("s")).await;
    assert!(matches!(
        reply.outcome,
        AnswerOutcome::DocumentUnavailable {
            kind: BuildFailureKind::FetchError,
            ..
        }
    ));
    assert_eq!(llm.call_count(), 0);
    assert!(!chat.describe_session("s").await.context_cached);
}
