use crate::types::{AppError, ChatModeInfo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the assistant should treat the retrieved context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Question answering
    #[default]
    Chat,
    Summarize,
    Insights,
    Planning,
}

const CHAT_PROMPT: &str = "\
You are a Knowledge Assistant. You help people find and understand information in the documents they uploaded.

Ground rules:
- Answer from the document context you are given.
- Say which source each piece of information comes from.
- Explain how you reached your answer.
- When the documents do not contain the answer, say so plainly.
- Indicate how confident you are in each part of the answer.
- Write naturally and conversationally, but be thorough.

Structure:
- Lead with a direct answer to the question.
- Back it up with references to specific source documents.
- Point out connections between sources where they matter.
- Note gaps or limitations in the available material.
- Where useful, suggest follow-up questions.";

const SUMMARIZE_PROMPT: &str = "\
You are writing a summary of information drawn from several documents.

Guidelines:
- Be complete but concise.
- Group related information into clearly labelled sections.
- Bring out the main themes and key points.
- Flag places where sources disagree.
- Indicate how confident you are in each point.
- Cite the document behind every major claim.";

const INSIGHTS_PROMPT: &str = "\
You are analysing documents to surface insights.

Guidelines:
- Look for patterns, trends and links between documents.
- Name the recurring themes and topics.
- Call out notable similarities and differences.
- Describe likely implications and conclusions.
- Mark areas that deserve further investigation.
- Support every insight with evidence from the documents.";

const PLANNING_PROMPT: &str = "\
You are helping someone plan and make decisions using information from their documents.

Guidelines:
- Pull out actionable items and concrete next steps.
- Propose priorities based on what the documents say.
- Raise risks and open considerations.
- List any extra information that would improve the plan.
- Keep recommendations structured and practical.
- Base every suggestion on evidence from the documents.";

impl ChatMode {
    pub const ALL: [ChatMode; 4] = [
        ChatMode::Chat,
        ChatMode::Summarize,
        ChatMode::Insights,
        ChatMode::Planning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Chat => "chat",
            ChatMode::Summarize => "summarize",
            ChatMode::Insights => "insights",
            ChatMode::Planning => "planning",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            ChatMode::Chat => CHAT_PROMPT,
            ChatMode::Summarize => SUMMARIZE_PROMPT,
            ChatMode::Insights => INSIGHTS_PROMPT,
            ChatMode::Planning => PLANNING_PROMPT,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ChatMode::Chat => "General question-answering with document context",
            ChatMode::Summarize => "Summarize information from multiple documents",
            ChatMode::Insights => "Analyze documents for patterns and insights",
            ChatMode::Planning => "Generate actionable plans and recommendations",
        }
    }

    pub fn use_case(&self) -> &'static str {
        match self {
            ChatMode::Chat => "Ask questions about your documents and get detailed answers",
            ChatMode::Summarize => "Get comprehensive summaries of document content",
            ChatMode::Insights => "Discover trends, patterns, and key insights across documents",
            ChatMode::Planning => "Get structured plans and next steps based on document content",
        }
    }

    pub fn info(&self) -> ChatModeInfo {
        ChatModeInfo {
            name: self.as_str().to_string(),
            description: self.description().to_string(),
            use_case: self.use_case().to_string(),
        }
    }

    /// Catalogue served by `GET /api/chat/modes`.
    pub fn catalogue() -> Vec<ChatModeInfo> {
        Self::ALL.iter().map(ChatMode::info).collect()
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| {
                AppError::InvalidInput(
                    "Invalid mode. Must be one of: chat, summarize, insights, planning".to_string(),
                )
            })
    }
}
