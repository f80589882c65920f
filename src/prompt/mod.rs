//! System prompt for recipe creation and the small auxiliary prompts used
//! around it.
//!
//! The long static sections live in `.txt` files next to this module and are
//! embedded at compile time with `include_str!`, so they can be edited
//! without dealing with Rust string syntax.

use serde::Deserialize;

pub const PREAMBLE: &str = include_str!("preamble.txt");
pub const INGREDIENTS_GENERAL: &str = include_str!("ingredients.txt");
pub const USER_ASSUMPTIONS: &str = include_str!("assumptions.txt");
pub const FORMAT: &str = include_str!("format.txt");

/// Reply the model gives when a description holds no links
pub const NO_LINKS: &str = "<NULL>";

/// User preferences folded into the system prompt
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Preferences {
    #[serde(default = "default_servings")]
    pub servings: u32,
    /// Total time budget in minutes
    #[serde(default)]
    pub time_budget: Option<u32>,
    #[serde(default)]
    pub vegetarian: bool,
    #[serde(default)]
    pub vegan: bool,
    #[serde(default)]
    pub gluten_free: bool,
}

fn default_servings() -> u32 {
    4
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            servings: default_servings(),
            time_budget: None,
            vegetarian: false,
            vegan: false,
            gluten_free: false,
        }
    }
}

fn substitute(kind: &str) -> String {
    format!(
        "The user prefers you to include {kind} substitute ingredients where necessary and \
         adjust cooking time and preparation steps for the substitute ingredients."
    )
}

/// Build the preferences clause. Only active flags produce a line, in the
/// order: time, vegetarian (when not vegan), vegan, gluten-free.
pub fn build_preferences(preferences: &Preferences) -> String {
    let mut lines = Vec::new();

    if let Some(minutes) = preferences.time_budget {
        lines.push(format!(
            "The user has {minutes} minutes to prepare and cook the dish, \
             adjust the recipe so it can be completed in that time."
        ));
    }
    if preferences.vegetarian && !preferences.vegan {
        lines.push(substitute("vegetarian"));
    }
    if preferences.vegan {
        lines.push(substitute("vegan"));
    }
    if preferences.gluten_free {
        lines.push(substitute("gluten-free"));
    }

    lines.join("\n")
}

fn servings_clause(servings: u32) -> String {
    format!("Unless told otherwise, create the recipe to serve {servings} people.")
}

/// Assemble the full recipe creation system prompt
pub fn build_system_prompt(preferences: &Preferences) -> String {
    let preference_clause = build_preferences(preferences);
    let servings = servings_clause(preferences.servings);

    let mut sections = vec![
        PREAMBLE.trim(),
        INGREDIENTS_GENERAL.trim(),
        servings.as_str(),
    ];
    if !preference_clause.is_empty() {
        sections.push(preference_clause.as_str());
    }
    sections.push(USER_ASSUMPTIONS.trim());
    sections.push(FORMAT.trim());

    sections.join("\n\n")
}

pub fn parse_links(description: &str) -> String {
    format!(
        "Please provide all the links in this text, separated by commas. \
         Include only the links in your response. \
         If there are no links return {NO_LINKS}. \
         Text: {description}"
    )
}

pub fn strip_links(description: &str) -> String {
    format!(
        "Please remove all the text from this description pertaining to links. \
         Respond only with the remaining text. Text: {description}"
    )
}

pub fn recipe_name(content: &str) -> String {
    format!(
        "Please provide an informative but concise name for this recipe. \
         Respond with only the name. Recipe: {content}"
    )
}

pub fn recipe_summary(content: &str) -> String {
    format!(
        "Please provide an exciting but informative summary of around 25 words \
         for this recipe. Respond with only the summary. Recipe: {content}"
    )
}

pub const RANDOM_PHRASE: &str = "Create a random phrase that might describe a recipe. \
     Use around five words and return only the phrase.";
