use super::{report, Progress, ProgressSender};
use crate::config::AppConfig;
use crate::error::{ColunchError, Result};
use crate::model::Recipe;
use crate::prompt::{self, Preferences, NO_LINKS};
use crate::providers::{Chat, ChatMessage, ContentPart, LlmProvider, OpenAIProvider};
use crate::repository::{open_repository, RecipeRepository};
use crate::sources::{ImagePayload, Source, SourceExtractor};
use futures::future::try_join_all;
use log::{debug, info};
use std::sync::Arc;

/// Models and preferences used while writing a recipe
#[derive(Debug, Clone)]
pub struct RecipeSettings {
    pub chat_model: String,
    pub vision_model: String,
    /// Completion limit for vision requests
    pub max_tokens: u32,
    pub preferences: Preferences,
}

impl RecipeSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            chat_model: config.openai.chat_model(),
            vision_model: config.openai.vision_model.clone(),
            max_tokens: config.openai.max_tokens,
            preferences: config.preferences.clone(),
        }
    }
}

/// Creates, stores and finds recipes.
///
/// Holds no per-request state: each operation starts fresh conversations over
/// the shared provider, so one `RecipeBook` serves concurrent requests.
pub struct RecipeBook {
    provider: Arc<dyn LlmProvider>,
    sources: SourceExtractor,
    repository: Arc<dyn RecipeRepository>,
    settings: RecipeSettings,
}

impl RecipeBook {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        sources: SourceExtractor,
        repository: Arc<dyn RecipeRepository>,
        settings: RecipeSettings,
    ) -> Self {
        Self {
            provider,
            sources,
            repository,
            settings,
        }
    }

    /// Wire up the OpenAI provider, extractors and storage named in `config`
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let provider: Arc<dyn LlmProvider> = Arc::new(OpenAIProvider::new(&config.openai)?);
        let sources = SourceExtractor::from_config(&config.sources, provider.clone())?;
        let repository = open_repository(&config.storage).await?;
        Ok(Self::new(
            provider,
            sources,
            repository,
            RecipeSettings::from_config(config),
        ))
    }

    pub fn sources(&self) -> &SourceExtractor {
        &self.sources
    }

    pub fn settings(&self) -> &RecipeSettings {
        &self.settings
    }

    /// One-off question in a fresh conversation
    async fn ask(&self, question: String) -> Result<String> {
        Chat::new(self.provider.clone(), self.settings.chat_model.clone())
            .ask(question)
            .await
    }

    /// All links mentioned in `description`, in order, duplicates kept
    pub async fn parse_links(&self, description: &str) -> Result<Vec<String>> {
        let answer = self.ask(prompt::parse_links(description)).await?;
        debug!("Links answer: {:?}", answer);
        Ok(split_links(&answer))
    }

    /// `description` with everything about links removed
    pub async fn strip_links(&self, description: &str) -> Result<String> {
        self.ask(prompt::strip_links(description)).await
    }

    /// Free text of the description followed by the text behind each of its
    /// links, newline separated.
    ///
    /// Links are resolved concurrently; the first failing link fails the
    /// whole description.
    pub async fn compose_description(
        &self,
        description: &str,
        progress: Option<&ProgressSender>,
    ) -> Result<String> {
        report(progress, Progress::ReadingLinks);
        let (links, stripped) =
            tokio::try_join!(self.parse_links(description), self.strip_links(description))?;
        info!("Found {} link(s) in description", links.len());

        let link_texts = try_join_all(links.iter().map(|link| async move {
            report(progress, Progress::ResolvingSource(link.clone()));
            let text = self.sources.link_to_text(link).await?;
            report(
                progress,
                Progress::SourceResolved {
                    source: link.clone(),
                    text: text.clone(),
                },
            );
            Ok::<_, ColunchError>(text)
        }))
        .await?;

        let mut parts = Vec::with_capacity(link_texts.len() + 1);
        parts.push(stripped);
        parts.extend(link_texts);
        Ok(parts.join("\n"))
    }

    /// Write recipe content from a description and/or images
    pub async fn generate_content(
        &self,
        description: &str,
        images: &[ImagePayload],
        progress: Option<&ProgressSender>,
    ) -> Result<String> {
        let description = description.trim();
        if description.is_empty() && images.is_empty() {
            return Err(ColunchError::EmptyInput);
        }

        let text = if description.is_empty() {
            None
        } else {
            Some(self.compose_description(description, progress).await?)
        };

        report(progress, Progress::WritingRecipe);
        self.write_recipe(text, images).await
    }

    async fn write_recipe(&self, text: Option<String>, images: &[ImagePayload]) -> Result<String> {
        let system_prompt = prompt::build_system_prompt(&self.settings.preferences);

        if images.is_empty() {
            let mut chat = Chat::from_system_prompt(
                self.provider.clone(),
                self.settings.chat_model.clone(),
                system_prompt,
            );
            return chat.complete(ChatMessage::user(text.unwrap_or_default())).await;
        }

        let mut parts: Vec<ContentPart> = Vec::with_capacity(images.len() + 1);
        if let Some(text) = text.filter(|t| !t.trim().is_empty()) {
            parts.push(ContentPart::text(text));
        }
        parts.extend(images.iter().map(ImagePayload::to_content_part));
        info!("Writing recipe from {} image(s)", images.len());

        let mut chat = Chat::from_system_prompt(
            self.provider.clone(),
            self.settings.vision_model.clone(),
            system_prompt,
        )
        .with_max_tokens(self.settings.max_tokens);
        chat.complete(ChatMessage::user_parts(parts)).await
    }

    pub async fn name_recipe(&self, content: &str) -> Result<String> {
        let name = self.ask(prompt::recipe_name(content)).await?;
        Ok(clean_reply(&name))
    }

    pub async fn summarise_recipe(&self, content: &str) -> Result<String> {
        let summary = self.ask(prompt::recipe_summary(content)).await?;
        Ok(clean_reply(&summary))
    }

    /// Create a recipe from a description and/or images and store it
    pub async fn create(
        &self,
        description: &str,
        images: &[ImagePayload],
        progress: Option<&ProgressSender>,
    ) -> Result<Recipe> {
        let content = self.generate_content(description, images, progress).await?;
        self.finish(content, progress).await
    }

    /// Create a recipe from one explicit source, whatever its host
    pub async fn create_from_source(
        &self,
        source: &Source,
        progress: Option<&ProgressSender>,
    ) -> Result<Recipe> {
        let content = match source {
            Source::Image(image) => {
                report(progress, Progress::WritingRecipe);
                self.write_recipe(None, std::slice::from_ref(image)).await?
            }
            Source::Webpage(url) | Source::Video(url) => {
                report(progress, Progress::ResolvingSource(url.clone()));
                let text = self.sources.resolve_text(source).await?;
                report(
                    progress,
                    Progress::SourceResolved {
                        source: url.clone(),
                        text: text.clone(),
                    },
                );
                let label = match source {
                    Source::Video(_) => "Transcript",
                    _ => "Webpage content",
                };

                report(progress, Progress::WritingRecipe);
                self.write_recipe(Some(format!("{label}: {text}")), &[])
                    .await?
            }
        };
        self.finish(content, progress).await
    }

    /// Name, summarise, embed and store freshly written content
    async fn finish(&self, content: String, progress: Option<&ProgressSender>) -> Result<Recipe> {
        report(progress, Progress::NamingRecipe);
        let (name, summary) =
            tokio::try_join!(self.name_recipe(&content), self.summarise_recipe(&content))?;
        let recipe = Recipe::new(name, summary, content);

        report(progress, Progress::StoringRecipe);
        let vector = self.provider.embed(&recipe.content).await?;
        self.repository.store(&recipe, &vector).await?;
        info!("Created recipe {} ({})", recipe.name, recipe.id);
        Ok(recipe)
    }

    pub async fn get(&self, id: &str) -> Result<Recipe> {
        self.repository.get(id).await
    }

    /// Recipes most similar to `query`
    pub async fn search(&self, query: &str, n: usize) -> Result<Vec<Recipe>> {
        let vector = self.provider.embed(query).await?;
        self.repository.search(&vector, n).await
    }

    /// Search with a phrase the model makes up
    pub async fn random_recipes(&self, n: usize) -> Result<(String, Vec<Recipe>)> {
        let phrase = clean_reply(&self.ask(prompt::RANDOM_PHRASE.to_string()).await?);
        let recipes = self.search(&phrase, n).await?;
        Ok((phrase, recipes))
    }
}

/// Split the model's comma separated link list, honouring the no-links sentinel
pub fn split_links(answer: &str) -> Vec<String> {
    answer
        .split([',', '\n'])
        .map(str::trim)
        .filter(|link| !link.is_empty() && !link.eq_ignore_ascii_case(NO_LINKS))
        .map(String::from)
        .collect()
}

/// Trim whitespace and wrapping quotes from a one-line reply
fn clean_reply(reply: &str) -> String {
    reply
        .trim()
        .trim_matches(|c| c == '"' || c == '*')
        .trim()
        .to_string()
}
