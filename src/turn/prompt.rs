use super::types::{LanguageCode, RoleplayContext};

/// Which instructions the generator receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    /// Stay in character for a scenario
    Roleplay,
    /// Friendly general-purpose tutor
    GenericTutor,
}

impl PromptTemplate {
    /// Template choice depends only on whether a roleplay context is present
    pub fn select(roleplay: Option<&RoleplayContext>) -> Self {
        match roleplay {
            Some(_) => PromptTemplate::Roleplay,
            None => PromptTemplate::GenericTutor,
        }
    }

    /// Text that appears in every prompt built from this template and in no other
    pub fn marker(self) -> &'static str {
        match self {
            PromptTemplate::Roleplay => ROLEPLAY_MARKER,
            PromptTemplate::GenericTutor => TUTOR_MARKER,
        }
    }
}

const ROLEPLAY_MARKER: &str = "IMPORTANT ROLEPLAY GUIDELINES:";
const TUTOR_MARKER: &str = "You are SpeakGenie, a friendly AI language tutor for children.";

/// Prompt text together with the template it came from
#[derive(Debug, Clone)]
pub struct Prompt {
    pub template: PromptTemplate,
    pub text: String,
}

/// Build the generator prompt for a transcript
pub fn build_prompt(
    transcript: &str,
    language: &LanguageCode,
    roleplay: Option<&RoleplayContext>,
) -> Prompt {
    let template = PromptTemplate::select(roleplay);

    let text = match roleplay {
        Some(context) => roleplay_prompt(transcript, language, context),
        None => tutor_prompt(transcript, language),
    };

    Prompt { template, text }
}

fn roleplay_prompt(transcript: &str, language: &LanguageCode, context: &RoleplayContext) -> String {
    format!(
        "You are in a roleplay scenario: {title}. {context}\n\
         \n\
         The student said: \"{transcript}\" in {language}.\n\
         \n\
         {ROLEPLAY_MARKER}\n\
         - Stay in character for the scenario\n\
         - Keep responses simple and age-appropriate for children\n\
         - Ask follow-up questions to continue the conversation\n\
         - Use encouraging and positive language\n\
         - If the student makes mistakes, gently guide them with examples\n\
         - Limit responses to 1-2 sentences\n\
         - Use vocabulary appropriate for language learners\n\
         - Incorporate scenario-specific words and phrases\n\
         \n\
         Respond naturally in the same language ({language}) as if you are really in this situation with the student.",
        title = context.scenario_title,
        context = context.context_text,
    )
}

fn tutor_prompt(transcript: &str, language: &LanguageCode) -> String {
    format!(
        "{TUTOR_MARKER} A child said: \"{transcript}\" in {language}.\n\
         \n\
         Your reply should be:\n\
         - Simple and encouraging\n\
         - In the same language ({language})\n\
         - Educational but fun\n\
         - 1-2 sentences maximum\n\
         - Help them learn while being supportive\n\
         \n\
         Respond naturally and helpfully."
    )
}
