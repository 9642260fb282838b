//! End-to-end assistant conversations over the real engine with scripted
//! collaborators: gathering, routing, research, task handoff, termination,
//! and summarization.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use asesor::{
    AssistantDeps, BusinessProfile, ChatService, DocumentIndex, InMemoryMemoryStore,
    KeywordExtractor, MemoryStore, ReplyStatus, SearchProvider, SearchResult,
};
use charla_checkpoint::InMemoryCheckpointStore;
use charla_core::{ChatModel, Message, Result, ToolCall, ToolSchema};

/// Dispatches on the calling agent's system directive, like the real model
/// would on its instructions.
struct ScriptedModel;

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        _tools: &[ToolSchema],
    ) -> Result<Message> {
        if system.contains("analista de mercado") {
            return Ok(Message::assistant(
                "He identificado tres oportunidades de crecimiento para tu negocio.",
            ));
        }
        if system.contains("resume conversaciones") {
            return Ok(Message::assistant(
                "Resumen: panadería en Lima, consulta sobre precios.",
            ));
        }
        // Conversational agent: delegate when the user asks for the
        // specialist, otherwise answer directly.
        let wants_specialist = messages
            .iter()
            .any(|m| m.is_user() && m.content.contains("especialista"));
        if wants_specialist {
            Ok(
                Message::assistant("se lo encargo al especialista").with_tool_calls(vec![
                    ToolCall::new(
                        "call-1",
                        "assign_task_to_researcher",
                        json!({"task": "estudio de precios de panaderías"}),
                    ),
                ]),
            )
        } else {
            Ok(Message::assistant(
                "Buen punto. Te recomiendo revisar tus márgenes antes de decidir.",
            ))
        }
    }
}

struct StubSearch;

#[async_trait]
impl SearchProvider for StubSearch {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>> {
        Ok(Vec::new())
    }
}

struct StubIndex;

#[async_trait]
impl DocumentIndex for StubIndex {
    async fn lookup(&self, _query: &str, _limit: usize) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

fn service_with(memory: Arc<InMemoryMemoryStore>) -> ChatService {
    let deps = AssistantDeps::new(
        Arc::new(ScriptedModel),
        Arc::new(KeywordExtractor::new()),
        memory,
        Arc::new(StubSearch),
        Arc::new(StubIndex),
    );
    ChatService::from_deps(deps, Arc::new(InMemoryCheckpointStore::new())).unwrap()
}

fn complete_profile() -> BusinessProfile {
    BusinessProfile {
        nombre_empresa: Some("Panes SAC".into()),
        sector: Some("Panadería".into()),
        ubicacion: Some("Lima".into()),
        descripcion_negocio: Some("panadería artesanal".into()),
        productos_servicios_principales: vec!["pan".into(), "tortas".into()],
        ..Default::default()
    }
}

#[tokio::test]
async fn fresh_thread_gathers_before_anything_else() {
    let service = service_with(Arc::new(InMemoryMemoryStore::new()));

    let reply = service
        .process_message("t1", "Tengo una panadería en Lima", false)
        .await;

    // The assistant greeted, extracted what it could, and asked a
    // clarifying question; the thread now awaits the answer.
    assert_eq!(reply.status, ReplyStatus::AwaitingReply);
    assert!(reply.answer.contains("asistente especializado en PYMES"));
    assert!(reply.answer.contains("el nombre de la empresa"));
    assert!(reply.interrupt_prompt.is_some());

    let record = service.executor().state("t1").await.unwrap().unwrap();
    assert!(record.is_suspended());
    assert_eq!(record.context_value("sector"), Some(&json!("Panadería")));
    assert_eq!(record.context_value("ubicacion"), Some(&json!("Lima")));
}

#[tokio::test]
async fn gathering_walks_to_research_over_turns() {
    let memory = Arc::new(InMemoryMemoryStore::new());
    let service = service_with(memory.clone());

    service
        .process_message("t1", "Tengo una panadería en Lima", false)
        .await;
    let reply = service
        .process_message("t1", "Mi empresa se llama Panes SAC", false)
        .await;
    assert!(reply.answer.contains("una descripción general del negocio"));

    let reply = service
        .process_message("t1", "Vendemos pan artesanal a restaurantes", false)
        .await;
    assert!(reply.answer.contains("los productos o servicios principales"));

    // Last critical field arrives; with a complete profile and no explicit
    // request, the conversational agent takes the turn.
    let reply = service
        .process_message("t1", "pan artesanal, tortas, catering", false)
        .await;
    assert_eq!(reply.status, ReplyStatus::AwaitingReply);
    assert!(reply.answer.contains("Te recomiendo"));

    // An explicit research request now routes to the researcher.
    let reply = service
        .process_message("t1", "Investiga las oportunidades de mi mercado", false)
        .await;
    assert_eq!(reply.status, ReplyStatus::AwaitingReply);
    assert!(reply.answer.contains("tres oportunidades"));

    // The profile made it to long-term memory along the way.
    let saved = memory.recall("t1").await.unwrap().unwrap();
    assert_eq!(saved.nombre_empresa.as_deref(), Some("Panes SAC"));
    assert!(saved.can_research());
}

#[tokio::test]
async fn termination_token_completes_from_any_suspension() {
    let service = service_with(Arc::new(InMemoryMemoryStore::new()));

    let reply = service
        .process_message("t1", "Tengo una panadería en Lima", false)
        .await;
    assert_eq!(reply.status, ReplyStatus::AwaitingReply);

    let reply = service.process_message("t1", "gracias", false).await;
    assert_eq!(reply.status, ReplyStatus::Completed);
    assert!(reply.answer.contains("Gracias por tu consulta"));

    let record = service.executor().state("t1").await.unwrap().unwrap();
    assert!(!record.is_suspended());
    assert_eq!(record.stage, charla_core::Stage::Done);
}

#[tokio::test]
async fn returning_business_is_recognized_and_task_handoff_works() {
    let memory = Arc::new(InMemoryMemoryStore::new());
    memory.persist("t1", &complete_profile()).await.unwrap();
    let service = service_with(memory);

    let reply = service
        .process_message(
            "t1",
            "Hola, quiero que el especialista haga un estudio de precios",
            false,
        )
        .await;

    // Conversational agent delegated via the task handoff; the researcher
    // answered from the narrowed brief.
    assert_eq!(reply.status, ReplyStatus::AwaitingReply);
    assert!(reply.answer.contains("tres oportunidades"));

    let record = service.executor().state("t1").await.unwrap().unwrap();
    assert_eq!(
        record.context_value("assigned_task"),
        Some(&json!("estudio de precios de panaderías"))
    );
    // The task brief replaced the accumulated history before the
    // researcher ran.
    assert!(record
        .messages
        .iter()
        .any(|m| m.content.contains("Tarea asignada: estudio de precios")));
}

#[tokio::test]
async fn long_histories_are_summarized_with_explicit_truncation() {
    let memory = Arc::new(InMemoryMemoryStore::new());
    memory.persist("t1", &complete_profile()).await.unwrap();

    let deps = AssistantDeps::new(
        Arc::new(ScriptedModel),
        Arc::new(KeywordExtractor::new()),
        memory,
        Arc::new(StubSearch),
        Arc::new(StubIndex),
    )
    .with_summarize_threshold(4);
    let service =
        ChatService::from_deps(deps, Arc::new(InMemoryCheckpointStore::new())).unwrap();

    service.process_message("t1", "hola", false).await;
    let before = service.executor().state("t1").await.unwrap().unwrap();
    assert!(before.messages.len() >= 3);

    let reply = service
        .process_message("t1", "¿qué opinas de mis precios?", false)
        .await;
    assert_eq!(reply.status, ReplyStatus::AwaitingReply);

    let after = service.executor().state("t1").await.unwrap().unwrap();
    assert_eq!(
        after.summary.as_deref(),
        Some("Resumen: panadería en Lima, consulta sobre precios.")
    );
    // The documented truncation kept the tail and the turn's new messages.
    assert!(after.messages.len() < before.messages.len() + 2);
}

#[tokio::test]
async fn conversation_survives_service_restart() {
    let memory = Arc::new(InMemoryMemoryStore::new());
    let store = Arc::new(InMemoryCheckpointStore::new());

    let build = |memory: Arc<InMemoryMemoryStore>, store: Arc<InMemoryCheckpointStore>| {
        let deps = AssistantDeps::new(
            Arc::new(ScriptedModel),
            Arc::new(KeywordExtractor::new()),
            memory,
            Arc::new(StubSearch),
            Arc::new(StubIndex),
        );
        ChatService::from_deps(deps, store).unwrap()
    };

    {
        let service = build(memory.clone(), store.clone());
        let reply = service
            .process_message("t1", "Tengo una panadería en Lima", false)
            .await;
        assert_eq!(reply.status, ReplyStatus::AwaitingReply);
        // Service dropped: simulated process restart.
    }

    let service = build(memory, store);
    let reply = service
        .process_message("t1", "Mi empresa se llama Panes SAC", false)
        .await;
    assert_eq!(reply.status, ReplyStatus::AwaitingReply);

    let record = service.executor().state("t1").await.unwrap().unwrap();
    assert_eq!(
        record.context_value("nombre_empresa"),
        Some(&json!("Panes SAC"))
    );

    let history = service.history("t1").await.unwrap();
    assert!(history.iter().any(|entry| entry.role == "human"
        && entry.content.contains("panadería en Lima")));
}

#[tokio::test]
async fn reset_starts_a_fresh_conversation() {
    let service = service_with(Arc::new(InMemoryMemoryStore::new()));

    service
        .process_message("t1", "Tengo una panadería en Lima", false)
        .await;
    let reply = service.process_message("t1", "empecemos de cero", true).await;
    assert_eq!(reply.status, ReplyStatus::AwaitingReply);

    let record = service.executor().state("t1").await.unwrap().unwrap();
    // The conversation history starts over; long-term memory re-seeds the
    // profile fields that were already learned.
    assert_eq!(record.messages[0].content, "empecemos de cero");
    assert!(record.messages.len() <= 4);
    assert_eq!(record.context_value("sector"), Some(&json!("Panadería")));
}
