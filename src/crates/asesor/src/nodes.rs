//! Assistant graph nodes
//!
//! The nodes that make up the assistant flow. Routing between them is
//! declared in [`graph`](crate::graph); each node here only reads state and
//! returns a patch or a command.
//!
//! The supervisor is the consolidated routing brain: it extracts business
//! facts from the latest message, detects intent, and writes both into the
//! state record's context so the priority routing function stays a pure
//! function of state. The feedback node is the single suspension point of
//! the graph; every agent's turn funnels through it, and the next inbound
//! message resumes there.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use charla_core::{
    ChatModel, Command, Message, NodeContext, NodeResult, Result, Stage, StatePatch, StateRecord,
};

use crate::extract::Extractor;
use crate::intent::detect_intent;
use crate::memory::MemoryStore;
use crate::profile::BusinessProfile;

/// First-contact greeting for an unknown business
const WELCOME_NEW: &str = "¡Hola! Soy tu asistente especializado en PYMES. Te ayudo a \
    identificar oportunidades de crecimiento y desarrollar estrategias para tu negocio.\n\n\
    Para comenzar, ¿podrías contarme el nombre de tu empresa y a qué se dedica?";

/// Prompt shown to the user at every suspension
const FEEDBACK_PROMPT: &str = "Proporcione su respuesta o escriba 'listo' para finalizar:";

/// Greeting node for fresh threads
///
/// Seeds the context from long-term memory when the thread has no profile
/// yet, then greets accordingly: a returning business gets a recap offer, a
/// new one gets the intake pitch.
pub struct WelcomeNode {
    memory: Arc<dyn MemoryStore>,
}

impl WelcomeNode {
    pub fn new(memory: Arc<dyn MemoryStore>) -> Self {
        Self { memory }
    }

    pub async fn execute(&self, state: StateRecord, ctx: NodeContext) -> Result<NodeResult> {
        let mut profile = BusinessProfile::from_context(&state.context);
        let mut patch = StatePatch::new();

        if profile.nombre_empresa.is_none() {
            match self.memory.recall(ctx.thread()).await {
                Ok(Some(saved)) => {
                    info!(thread_id = %ctx.thread(), "seeding profile from long-term memory");
                    profile.merge(&saved);
                    for (key, value) in profile.to_context() {
                        patch.context.insert(key, value);
                    }
                }
                Ok(None) => {}
                Err(err) => warn!(error = %err, "memory recall failed, starting blank"),
            }
        }

        let (text, stage) = match &profile.nombre_empresa {
            Some(nombre) => (
                format!(
                    "¡Hola! Veo que ya tengo información sobre {nombre}. ¿En qué puedo \
                     ayudarte hoy? Puedo investigar oportunidades de crecimiento, darte \
                     un consejo específico o actualizar los datos de tu negocio."
                ),
                Stage::Conversation,
            ),
            None => (WELCOME_NEW.to_string(), Stage::Gathering),
        };

        patch.messages.push(Message::assistant(text));
        patch.stage = Some(stage);
        Ok(NodeResult::Patch(patch))
    }
}

/// Routing brain: extraction, intent detection, context bookkeeping
///
/// Writes everything the priority router needs into the context map and
/// lets the conditional edge pick the successor. Profile changes are pushed
/// to long-term memory fire-and-forget; a memory failure is logged and
/// never surfaces into the conversation.
pub struct SupervisorNode {
    extractor: Arc<dyn Extractor>,
    memory: Arc<dyn MemoryStore>,
}

impl SupervisorNode {
    pub fn new(extractor: Arc<dyn Extractor>, memory: Arc<dyn MemoryStore>) -> Self {
        Self { extractor, memory }
    }

    pub async fn execute(&self, state: StateRecord, ctx: NodeContext) -> Result<NodeResult> {
        let user_text = state.last_user_text().unwrap_or_default().to_string();
        let profile = BusinessProfile::from_context(&state.context);

        let updated = self.extractor.extract(&user_text, &profile);
        let mut patch = StatePatch::new();
        if updated != profile {
            for (key, value) in updated.to_context() {
                patch.context.insert(key, value);
            }
            if let Err(err) = self.memory.persist(ctx.thread(), &updated).await {
                warn!(thread_id = %ctx.thread(), error = %err, "profile persist failed");
            }
        }

        let intent = detect_intent(&user_text);
        let missing = updated.missing_critical();

        let (reason, stage) = if intent.wants_change {
            ("el usuario quiere corregir información", Stage::Gathering)
        } else if !missing.is_empty() {
            ("faltan campos críticos del negocio", Stage::Gathering)
        } else if intent.wants_research {
            ("el usuario solicita investigación", Stage::Research)
        } else {
            ("información completa, conversación general", Stage::Conversation)
        };
        info!(thread_id = %ctx.thread(), reason, missing = missing.len(), "supervisor decision");

        patch.context.insert("wants_research".into(), json!(intent.wants_research));
        patch.context.insert(
            "wants_conversation".into(),
            json!(intent.wants_conversation),
        );
        patch.context.insert("wants_change".into(), json!(intent.wants_change));
        patch.context.insert("missing_criticos".into(), json!(missing));
        patch.context.insert("routing_reason".into(), json!(reason));
        patch.stage = Some(stage);

        Ok(NodeResult::Patch(patch))
    }
}

/// Information-gathering agent
///
/// Asks for exactly one missing field per turn, then hands the turn to the
/// feedback node. When nothing is missing (the correction path), it asks
/// what should be updated instead.
pub struct GatherNode;

impl GatherNode {
    pub fn execute(&self, state: StateRecord) -> Result<NodeResult> {
        let profile = BusinessProfile::from_context(&state.context);
        let wants_change = state
            .context_value("wants_change")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let text = match (wants_change, profile.next_question()) {
            (true, _) => "Claro, actualicemos los datos. ¿Qué información deseas corregir \
                          y cuál sería el valor correcto?"
                .to_string(),
            (false, Some((_, focus))) => {
                format!("Para ayudarte mejor, ¿podrías contarme {focus}?")
            }
            (false, None) => "Ya tengo la información básica de tu negocio. ¿Hay algo \
                              más que quieras contarme antes de continuar?"
                .to_string(),
        };

        Ok(NodeResult::Patch(
            StatePatch::new()
                .with_message(Message::assistant(text))
                .with_stage(Stage::Gathering),
        ))
    }
}

/// The graph's single suspension point
///
/// Suspends with the turn's assistant output as the payload; the next
/// inbound message resumes here. The resumed invocation records the reply
/// in the feedback trail and routes back to the supervisor, detouring
/// through the summarize node once the history grows past the threshold.
pub struct FeedbackNode {
    summarize_threshold: usize,
}

impl FeedbackNode {
    pub fn new(summarize_threshold: usize) -> Self {
        Self { summarize_threshold }
    }

    /// Assistant messages produced since the user last spoke, joined
    fn turn_answer(state: &StateRecord) -> String {
        let since_user = state
            .messages
            .iter()
            .rev()
            .take_while(|m| !m.is_user())
            .filter(|m| m.is_assistant())
            .map(|m| m.content.clone())
            .collect::<Vec<_>>();
        if since_user.is_empty() {
            "Esperando respuesta del asistente.".to_string()
        } else {
            since_user.into_iter().rev().collect::<Vec<_>>().join("\n\n")
        }
    }

    pub fn execute(&self, state: StateRecord, mut ctx: NodeContext) -> Result<NodeResult> {
        let answer = Self::turn_answer(&state);
        let reply = ctx.interrupt(json!({
            "answer": answer,
            "message": FEEDBACK_PROMPT,
        }))?;

        // Reached only on the resumed invocation; the executor has already
        // appended the user's message to the history.
        let text = reply
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| reply.to_string());
        let mut trail: Vec<Value> = state
            .context_value("feedback")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        trail.push(json!(text));

        let next = if state.messages.len() >= self.summarize_threshold {
            "summarize"
        } else {
            "supervisor"
        };

        Ok(NodeResult::Command(
            Command::new()
                .with_update(StatePatch::new().with_context("feedback", Value::Array(trail)))
                .with_goto(next),
        ))
    }
}

/// Summarization node, the one documented history truncation
///
/// Produces or extends the rolling summary with the model, then keeps only
/// the last `keep_last` messages. Everything dropped from the history
/// survives inside the summary, which the agent nodes feed back into every
/// model request.
pub struct SummarizeNode {
    model: Arc<dyn ChatModel>,
    keep_last: usize,
}

impl SummarizeNode {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            keep_last: 2,
        }
    }

    pub async fn execute(&self, state: StateRecord) -> Result<NodeResult> {
        let prompt = match &state.summary {
            Some(summary) => format!(
                "Este es el resumen actual: {summary}\nExtiéndelo con los mensajes nuevos:"
            ),
            None => "Crea un resumen de la conversación anterior:".to_string(),
        };

        let mut request = state.messages.clone();
        request.push(Message::user(prompt));
        let reply = self
            .model
            .complete(
                "Eres un asistente que resume conversaciones de negocios de forma breve y fiel.",
                &request,
                &[],
            )
            .await?;

        info!(kept = self.keep_last, "summarized conversation history");
        Ok(NodeResult::Patch(
            StatePatch::new()
                .with_summary(reply.content)
                .with_truncate_to(self.keep_last),
        ))
    }
}

/// Terminal node for the termination-token shortcut
pub struct FarewellNode;

impl FarewellNode {
    pub fn execute(&self) -> Result<NodeResult> {
        Ok(NodeResult::Patch(
            StatePatch::new()
                .with_message(Message::assistant(
                    "Gracias por tu consulta. ¡Esperamos haberte sido de ayuda! \
                     Escríbenos cuando quieras continuar.",
                ))
                .with_stage(Stage::Done),
        ))
    }
}
