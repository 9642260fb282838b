//! User intent detection
//!
//! Keyword-based detection of what the user wants this turn. The flags feed
//! the supervisor's priority routing; they are written into the state
//! record's context so the routing function stays a pure function of state.

/// Keywords signalling a market-research request
const RESEARCH_KEYWORDS: [&str; 7] = [
    "investiga",
    "analiza",
    "oportunidades",
    "mercado",
    "competencia",
    "crecimiento",
    "estrategia",
];

/// Keywords signalling a general-advice conversation
const CONVERSATION_KEYWORDS: [&str; 6] = [
    "qué opinas",
    "que opinas",
    "consejo",
    "recomienda",
    "tu opinión",
    "tu opinion",
];

/// Keywords signalling a correction of previously given information
const CHANGE_KEYWORDS: [&str; 6] = [
    "corrección",
    "correccion",
    "cambiar",
    "actualizar",
    "mejor dicho",
    "en realidad",
];

/// What the user appears to want this turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserIntent {
    /// Asking for market research or opportunity analysis
    pub wants_research: bool,

    /// Asking for advice or an opinion
    pub wants_conversation: bool,

    /// Correcting information given earlier
    pub wants_change: bool,
}

/// Detect intent from the raw message text
pub fn detect_intent(text: &str) -> UserIntent {
    let lowered = text.to_lowercase();
    UserIntent {
        wants_research: RESEARCH_KEYWORDS.iter().any(|k| lowered.contains(k)),
        wants_conversation: CONVERSATION_KEYWORDS.iter().any(|k| lowered.contains(k)),
        wants_change: CHANGE_KEYWORDS.iter().any(|k| lowered.contains(k)),
    }
}
