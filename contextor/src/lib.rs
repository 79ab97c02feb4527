//! Document-grounded question answering for a single fixed document.
//!
//! Public API: [`ChatOrchestrator::ask`]. Per question it resolves the session,
//! loads the cached document context or builds it from the source, narrows the
//! text to what the prompt can carry, calls the completion backend, and
//! returns a tagged [`AnswerOutcome`]. Nothing here fails per request: document
//! and completion failures become rendered answers, cache failures read as a
//! miss, and the interaction log runs detached after the reply is final.

pub mod chunk;
pub mod cfg;
mod error;
pub mod prompt;
pub mod render;
pub mod select;

mod api_types;

pub use api_types::{AnswerOutcome, ChatReply, ExcerptStats, SessionSnapshot};
pub use cfg::{ContextorConfig, Strategy};
pub use error::ContextorError;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use ai_llm_service::{
    CompletionClient, CompletionProfile,
    config::default_config::{config_excerpt, config_full_document},
    service_profiles::LlmServiceProfiles,
};
use chat_log::{DocumentInfo, Interaction, InteractionLogger, NoopChatLog, SqliteChatLog};
use context_store::{ContextStore, DocumentContext, StoreConfig};
use document_source::{BuildFailure, ContextSource, HttpDocumentSource};
use rand::distr::{Alphanumeric, SampleString};
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use prompt::{DocumentSection, Persona};

/// Generated session ids are `session_` followed by this many alphanumerics.
pub const SESSION_SUFFIX_LEN: usize = 10;

/// Fresh opaque session id, e.g. `session_a8Xk2PqZ0c`.
pub fn new_session_id() -> String {
    format!(
        "session_{}",
        Alphanumeric.sample_string(&mut rand::rng(), SESSION_SUFFIX_LEN)
    )
}

/// Caller-supplied id verbatim when non-blank, otherwise a new one.
pub fn resolve_session(session_id: Option<&str>) -> String {
    match session_id {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => new_session_id(),
    }
}

/// Ties the context store, document source, completion client and
/// interaction log together. Construct once and share behind an `Arc`.
pub struct ChatOrchestrator {
    cfg: ContextorConfig,
    persona: Persona,
    store: ContextStore,
    source: Arc<dyn ContextSource>,
    llm: Arc<dyn CompletionClient>,
    logger: Arc<dyn InteractionLogger>,
    model: Option<String>,
}

impl ChatOrchestrator {
    pub fn new(
        cfg: ContextorConfig,
        store: ContextStore,
        source: Arc<dyn ContextSource>,
        llm: Arc<dyn CompletionClient>,
        logger: Arc<dyn InteractionLogger>,
    ) -> Self {
        Self {
            persona: cfg.persona(),
            cfg,
            store,
            source,
            llm,
            logger,
            model: None,
        }
    }

    /// Model id reported by diagnostics.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds every collaborator from environment variables.
    ///
    /// Uses the configured cache backend, the HTTP/PDF document source, the
    /// DeepSeek-compatible completion profiles, and the SQLite log when
    /// `CHAT_LOG_DATABASE_URL` is set (a no-op log otherwise).
    ///
    /// # Errors
    /// Any invalid or missing configuration; `DEEPSEEK_API_KEY` is required.
    ///
    /// # Example
    /// ```no_run
    /// # use contextor::ChatOrchestrator;
    /// # #[tokio::main] async fn main() {
    /// let chat = ChatOrchestrator::from_env().await.unwrap();
    /// let reply = chat.ask("¿Cuáles son los requisitos de beca?", None).await;
    /// println!("{} -> {}", reply.session_id, reply.outcome.text());
    /// # }
    /// ```
    pub async fn from_env() -> Result<Self, ContextorError> {
        let cfg = ContextorConfig::from_env()?;
        let store = StoreConfig::from_env()?.build()?;
        let source = HttpDocumentSource::new(cfg.fetch_timeout)?;

        let full = config_full_document()?;
        let excerpt = config_excerpt()?;
        let model = excerpt.model.clone();
        let llm = LlmServiceProfiles::new(full, excerpt);

        let logger: Arc<dyn InteractionLogger> = match std::env::var("CHAT_LOG_DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            Some(url) => Arc::new(SqliteChatLog::connect(&url).await?),
            None => Arc::new(NoopChatLog),
        };

        info!(
            strategy = cfg.strategy.as_str(),
            budget = cfg.relevance_budget,
            cache = store.backend_name(),
            chat_log = logger.backend(),
            %model,
            "chat orchestrator ready"
        );
        Ok(Self::new(cfg, store, Arc::new(source), Arc::new(llm), logger).with_model(model))
    }

    pub fn config(&self) -> &ContextorConfig {
        &self.cfg
    }

    pub fn store(&self) -> &ContextStore {
        &self.store
    }

    pub fn logger_backend(&self) -> &'static str {
        self.logger.backend()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Answers `question` for `session_id` (a new session when absent).
    ///
    /// Always returns a reply; see [`AnswerOutcome`] for the failure shapes.
    #[instrument(skip_all, fields(session_id = tracing::field::Empty))]
    pub async fn ask(&self, question: &str, session_id: Option<&str>) -> ChatReply {
        let started = Instant::now();
        let session_id = resolve_session(session_id);
        tracing::Span::current().record("session_id", session_id.as_str());

        let mut built = None;
        let (outcome, excerpt, context_loaded) = match self.load_or_build(&session_id).await {
            Ok((ctx, fresh)) => {
                if fresh {
                    built = Some(DocumentInfo {
                        url: ctx.document_url().to_string(),
                        length: ctx.total_length(),
                        processed_at: ctx.processed_at(),
                    });
                }
                let (outcome, excerpt) = self.answer(&ctx, question).await;
                (outcome, excerpt, fresh)
            }
            Err(failure) => {
                error!(kind = failure.kind().as_str(), error = %failure, "document context unavailable");
                let outcome = AnswerOutcome::DocumentUnavailable {
                    rendered: render::document_unavailable(&failure, &self.persona),
                    kind: failure.kind(),
                    detail: failure.to_string(),
                };
                (outcome, None, false)
            }
        };

        let reply = ChatReply {
            session_id,
            outcome,
            context_loaded,
            response_time_ms: elapsed_ms(started.elapsed()),
            excerpt,
        };
        info!(
            outcome = reply.outcome.label(),
            context_loaded,
            latency_ms = reply.response_time_ms,
            "question handled"
        );

        self.spawn_log(&reply, question, built);
        reply
    }

    /// Drops the cached context of a session. Absent sessions are fine and
    /// cache failures are only logged.
    pub async fn clear_session(&self, session_id: &str) -> bool {
        match self.store.forget(session_id).await {
            Ok(removed) => {
                info!(session_id, removed, "session cleared");
                removed
            }
            Err(e) => {
                warn!(session_id, error = %e, "cache unavailable on forget");
                false
            }
        }
    }

    pub async fn describe_session(&self, session_id: &str) -> SessionSnapshot {
        let ctx = self.store.get(session_id).await;
        SessionSnapshot {
            session_id: session_id.to_string(),
            context_cached: ctx.is_some(),
            document_length: ctx.as_ref().map(|c| c.total_length()),
            processed_at: ctx.as_ref().map(|c| c.processed_at()),
        }
    }

    /// Cached context, or a freshly built one stored back best-effort.
    /// The flag is `true` when the context was built here.
    async fn load_or_build(
        &self,
        session_id: &str,
    ) -> Result<(DocumentContext, bool), BuildFailure> {
        if let Some(ctx) = self.store.get(session_id).await {
            return Ok((ctx, false));
        }

        info!(url = %self.cfg.document_url, "building document context");
        let ctx = self.source.build_context(&self.cfg.document_url).await?;
        self.store.put(session_id, &ctx).await;
        Ok((ctx, true))
    }

    async fn answer(
        &self,
        ctx: &DocumentContext,
        question: &str,
    ) -> (AnswerOutcome, Option<ExcerptStats>) {
        match self.cfg.strategy {
            Strategy::Relevance => {
                let excerpt =
                    select::select(ctx.document_text(), question, self.cfg.relevance_budget);
                let system = prompt::system_prompt(&self.persona, DocumentSection::Excerpt(&excerpt));
                let outcome = self
                    .complete(&system, question, CompletionProfile::Excerpt)
                    .await;
                (outcome, Some(ExcerptStats::from(&excerpt)))
            }
            Strategy::FullDocument => {
                let system = prompt::system_prompt(
                    &self.persona,
                    DocumentSection::Full(ctx.document_text()),
                );
                let outcome = self.complete(&system, question, CompletionProfile::Full).await;
                (outcome, None)
            }
            Strategy::ChunkScan => (self.scan_chunks(ctx, question).await, None),
        }
    }

    async fn complete(&self, system: &str, user: &str, profile: CompletionProfile) -> AnswerOutcome {
        let started = Instant::now();
        match self.llm.complete(system, user, profile).await {
            Ok(text) => {
                debug!(?profile, latency_ms = started.elapsed().as_millis(), "completion ok");
                AnswerOutcome::Answered { text }
            }
            Err(e) => {
                error!(?profile, kind = e.kind_label(), status = ?e.status_code(), error = %e, "completion failed");
                AnswerOutcome::CompletionFailed {
                    rendered: render::api_error(&e),
                    status: e.status_code(),
                    kind: e.kind_label(),
                }
            }
        }
    }

    /// Legacy strategy: ask chunk by chunk, stop at the first answer that is
    /// not the refusal sentence. Failed chunks are skipped.
    async fn scan_chunks(&self, ctx: &DocumentContext, question: &str) -> AnswerOutcome {
        let chunks = chunk::split_into_chunks(ctx.document_text(), self.cfg.chunk_max_chars);
        let total = chunks.len();
        info!(chunks = total, "scanning document chunks");

        for (i, chunk) in chunks.iter().enumerate() {
            let user = prompt::chunk_prompt(&self.persona, chunk, question, i + 1, total);
            match self
                .llm
                .complete(prompt::CHUNK_SYSTEM, &user, CompletionProfile::Excerpt)
                .await
            {
                Ok(answer) if !answer.trim().is_empty() && !self.persona.is_refusal(&answer) => {
                    info!(chunk = i + 1, total, "answer found in chunk");
                    return AnswerOutcome::Answered { text: answer };
                }
                Ok(_) => debug!(chunk = i + 1, total, "no answer in chunk"),
                Err(e) => warn!(chunk = i + 1, total, error = %e, "chunk failed; skipping"),
            }
        }

        AnswerOutcome::Answered {
            text: self.persona.refusal_sentence(),
        }
    }

    /// Records the exchange from a detached task; errors are logged and dropped.
    fn spawn_log(&self, reply: &ChatReply, question: &str, document: Option<DocumentInfo>) {
        let status_code = match &reply.outcome {
            AnswerOutcome::CompletionFailed { status, .. } => *status,
            _ => None,
        };
        let interaction = Interaction {
            session_id: reply.session_id.clone(),
            question: question.to_string(),
            response: reply.outcome.text().to_string(),
            response_time_ms: reply.response_time_ms,
            status: reply.outcome.log_status(),
            document,
            metadata: json!({
                "context_loaded": reply.context_loaded,
                "strategy": self.cfg.strategy.as_str(),
                "outcome": reply.outcome.label(),
                "status_code": status_code,
                "excerpt": reply.excerpt,
            }),
        };

        let logger = self.logger.clone();
        tokio::spawn(async move {
            let session_id = interaction.session_id.clone();
            if let Err(e) = logger.record(interaction).await {
                warn!(%session_id, error = %e, "interaction log failed");
            }
        });
    }
}

fn elapsed_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
