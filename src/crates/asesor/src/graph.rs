//! Assistant graph assembly
//!
//! Wires the nodes into the conversation topology and returns the compiled
//! graph plus the executor configuration that goes with it (termination
//! routed to the farewell node). All collaborators arrive through
//! [`AssistantDeps`]; nothing here touches a global.

use std::sync::Arc;

use serde_json::Value;

use charla_core::{
    ChatModel, ExecutorConfig, Graph, GraphBuilder, PriorityRouter, Result, StateRecord,
    ToolRegistry, END, START,
};
use charla_prebuilt::{handoff_tool, route_after_agent, task_handoff_tool, AgentNode, ToolNode};

use crate::extract::Extractor;
use crate::memory::MemoryStore;
use crate::nodes::{
    FarewellNode, FeedbackNode, GatherNode, SummarizeNode, SupervisorNode, WelcomeNode,
};
use crate::profile::BusinessProfile;
use crate::tools::{DocumentIndex, DocumentSearchTool, SearchProvider, SearchTool};

/// System directive for the research agent
const RESEARCH_PROMPT: &str = "Eres un analista de mercado para PYMES. Con la información del \
    negocio disponible, identifica oportunidades concretas de crecimiento. Usa la herramienta \
    `search` para datos externos (mercado, competencia, precios) y `search_documents` para \
    material interno. Responde con hallazgos específicos y accionables.";

/// System directive for the conversational agent
const CONVERSATION_PROMPT: &str = "Eres un asesor de negocios cercano y práctico para PYMES. \
    Responde consultas y da consejos concretos sobre el negocio del usuario. Si la consulta \
    requiere investigación de mercado, transfiere al agente investigador con las herramientas \
    de transferencia disponibles.";

/// History length at which the feedback node detours through summarize
const DEFAULT_SUMMARIZE_THRESHOLD: usize = 12;

/// Collaborators and tuning for the assistant graph
pub struct AssistantDeps {
    /// Chat completion collaborator shared by every agent
    pub model: Arc<dyn ChatModel>,

    /// Structured-field extraction collaborator
    pub extractor: Arc<dyn Extractor>,

    /// Long-term profile memory
    pub memory: Arc<dyn MemoryStore>,

    /// Web search collaborator for the research agent
    pub search: Arc<dyn SearchProvider>,

    /// Internal document index for both agents
    pub documents: Arc<dyn DocumentIndex>,

    /// History length that triggers summarization
    pub summarize_threshold: usize,
}

impl AssistantDeps {
    /// Deps with the default summarization threshold
    pub fn new(
        model: Arc<dyn ChatModel>,
        extractor: Arc<dyn Extractor>,
        memory: Arc<dyn MemoryStore>,
        search: Arc<dyn SearchProvider>,
        documents: Arc<dyn DocumentIndex>,
    ) -> Self {
        Self {
            model,
            extractor,
            memory,
            search,
            documents,
            summarize_threshold: DEFAULT_SUMMARIZE_THRESHOLD,
        }
    }

    /// Change the summarization threshold
    pub fn with_summarize_threshold(mut self, threshold: usize) -> Self {
        self.summarize_threshold = threshold;
        self
    }
}

/// Executor configuration matching the assistant graph
pub fn assistant_executor_config() -> ExecutorConfig {
    let mut config = ExecutorConfig::default().with_termination_node("farewell");
    // The feedback prompt offers "listo" as the closing word.
    config.termination_tokens.push("listo".into());
    config
}

/// Build and compile the assistant graph
pub fn build_assistant_graph(deps: AssistantDeps) -> Result<Graph> {
    let welcome = Arc::new(WelcomeNode::new(deps.memory.clone()));
    let supervisor = Arc::new(SupervisorNode::new(
        deps.extractor.clone(),
        deps.memory.clone(),
    ));
    let feedback = Arc::new(FeedbackNode::new(deps.summarize_threshold));
    let summarize = Arc::new(SummarizeNode::new(deps.model.clone()));

    let research_registry = ToolRegistry::from_tools([
        Arc::new(SearchTool::new(deps.search.clone())) as Arc<dyn charla_core::Tool>,
        Arc::new(DocumentSearchTool::new(deps.documents.clone())),
        handoff_tool(
            "conversational",
            Some("Transferir de vuelta al asesor conversacional"),
        ),
    ]);
    let researcher = Arc::new(
        AgentNode::new(deps.model.clone(), RESEARCH_PROMPT).with_tools(research_registry.clone()),
    );
    let research_tools = Arc::new(ToolNode::new(research_registry));

    let chat_registry = ToolRegistry::from_tools([
        Arc::new(DocumentSearchTool::new(deps.documents.clone())) as Arc<dyn charla_core::Tool>,
        handoff_tool(
            "researcher",
            Some("Transferir al agente investigador de mercado"),
        ),
        task_handoff_tool(
            "researcher",
            Some("Asignar una tarea específica de investigación de mercado"),
        ),
    ]);
    let conversational = Arc::new(
        AgentNode::new(deps.model.clone(), CONVERSATION_PROMPT).with_tools(chat_registry.clone()),
    );
    let chat_tools = Arc::new(ToolNode::new(chat_registry));

    let mut builder = GraphBuilder::new();

    builder.add_node("welcome", {
        let welcome = welcome.clone();
        move |state, ctx| {
            let welcome = welcome.clone();
            async move { welcome.execute(state, ctx).await }
        }
    });
    builder.add_node("supervisor", {
        let supervisor = supervisor.clone();
        move |state, ctx| {
            let supervisor = supervisor.clone();
            async move { supervisor.execute(state, ctx).await }
        }
    });
    builder.add_node("gather", |state, _ctx| async move { GatherNode.execute(state) });
    builder.add_node("researcher", {
        let researcher = researcher.clone();
        move |state, _ctx| {
            let researcher = researcher.clone();
            async move { researcher.execute(state).await }
        }
    });
    builder.add_node("research_tools", {
        let research_tools = research_tools.clone();
        move |state, _ctx| {
            let research_tools = research_tools.clone();
            async move { research_tools.execute(state).await }
        }
    });
    builder.add_node("conversational", {
        let conversational = conversational.clone();
        move |state, _ctx| {
            let conversational = conversational.clone();
            async move { conversational.execute(state).await }
        }
    });
    builder.add_node("chat_tools", {
        let chat_tools = chat_tools.clone();
        move |state, _ctx| {
            let chat_tools = chat_tools.clone();
            async move { chat_tools.execute(state).await }
        }
    });
    builder.add_node("feedback", {
        let feedback = feedback.clone();
        move |state, ctx| {
            let feedback = feedback.clone();
            async move { feedback.execute(state, ctx) }
        }
    });
    builder.add_node("summarize", {
        let summarize = summarize.clone();
        move |state, _ctx| {
            let summarize = summarize.clone();
            async move { summarize.execute(state).await }
        }
    });
    builder.add_node("farewell", |_state, _ctx| async move { FarewellNode.execute() });

    // Priority routing after the supervisor: corrections first, then
    // missing critical data, then explicit research requests, then chat.
    let supervisor_router = PriorityRouter::new("conversational")
        .rule(
            |s: &StateRecord| {
                s.context_value("wants_change")
                    .and_then(Value::as_bool)
                    .unwrap_or(false)
            },
            "gather",
        )
        .rule(
            |s: &StateRecord| !BusinessProfile::from_context(&s.context).can_research(),
            "gather",
        )
        .rule(
            |s: &StateRecord| {
                s.context_value("wants_research")
                    .and_then(Value::as_bool)
                    .unwrap_or(false)
            },
            "researcher",
        )
        .rule(
            |s: &StateRecord| {
                s.context_value("wants_conversation")
                    .and_then(Value::as_bool)
                    .unwrap_or(false)
            },
            "conversational",
        );
    let supervisor_branches = supervisor_router.branches();

    builder.add_edge(START, "welcome");
    builder.add_edge("welcome", "supervisor");
    builder.add_conditional_edge(
        "supervisor",
        supervisor_router.into_router_fn(),
        supervisor_branches,
    );
    builder.add_edge("gather", "feedback");
    builder.add_conditional_edge(
        "researcher",
        route_after_agent("research_tools", "feedback"),
        ["research_tools", "feedback"],
    );
    builder.add_edge("research_tools", "researcher");
    builder.add_conditional_edge(
        "conversational",
        route_after_agent("chat_tools", "feedback"),
        ["chat_tools", "feedback"],
    );
    builder.add_edge("chat_tools", "conversational");
    builder.add_edge("feedback", "supervisor");
    builder.add_edge("summarize", "supervisor");
    builder.add_edge("farewell", END);

    builder.compile()
}
