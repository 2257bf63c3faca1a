use serde::Serialize;

use crate::turn::RoleplayContext;

/// Static roleplay scenario definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleplayScenario {
    pub id: &'static str,
    pub title: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub initial_message: &'static str,
    /// Persona instructions handed to the reply generator
    #[serde(rename = "context")]
    pub context_text: &'static str,
}

impl RoleplayScenario {
    /// Persona data sent with every turn while this scenario is active
    pub fn roleplay_context(&self) -> RoleplayContext {
        RoleplayContext {
            scenario_title: self.title.to_string(),
            context_text: self.context_text.to_string(),
        }
    }
}

pub static SCENARIOS: [RoleplayScenario; 4] = [
    RoleplayScenario {
        id: "school",
        title: "At School",
        icon: "🏫",
        description: "Practice talking with teachers and classmates",
        initial_message: "Good morning! What's your name?",
        context_text: "You are a friendly teacher meeting a new student. Keep responses simple, encouraging, and ask basic questions about school life, subjects, and friends.",
    },
    RoleplayScenario {
        id: "store",
        title: "At the Store",
        icon: "🛒",
        description: "Learn to shop and ask for things you need",
        initial_message: "Welcome to our store! What would you like to buy today?",
        context_text: "You are a helpful shopkeeper. Ask about what they want to buy, help them with prices, and practice basic shopping vocabulary.",
    },
    RoleplayScenario {
        id: "home",
        title: "At Home",
        icon: "🏠",
        description: "Talk about family and daily activities",
        initial_message: "Hello! Tell me about your family. Who do you live with?",
        context_text: "You are a friendly neighbor asking about family and home life. Ask about family members, daily routines, and household activities.",
    },
    RoleplayScenario {
        id: "playground",
        title: "At the Playground",
        icon: "🎮",
        description: "Make friends and talk about games",
        initial_message: "Hi there! Do you want to play together? What games do you like?",
        context_text: "You are a friendly child at the playground. Talk about games, sports, hobbies, and making friends.",
    },
];

/// All built-in scenarios, in display order
pub fn catalog() -> &'static [RoleplayScenario] {
    &SCENARIOS
}

/// Look up a scenario by id
pub fn find_scenario(id: &str) -> Option<&'static RoleplayScenario> {
    SCENARIOS.iter().find(|scenario| scenario.id == id)
}
