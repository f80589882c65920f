//! HTML pages and htmx fragments.
//!
//! Every piece of user or model text goes through [`escape`]; only the
//! rendered recipe markdown is inserted as HTML.

use crate::error::ColunchError;
use crate::model::Recipe;
use crate::pipelines::Progress;
use html_escape::{encode_double_quoted_attribute, encode_text};

const INDEX: &str = include_str!("assets/index.html");
const RECIPE_PAGE: &str = include_str!("assets/recipe.html");

pub const DESCRIPTION_SOCKET: &str = "recipe-from-description-ws";
pub const WEBPAGE_SOCKET: &str = "recipe-from-webpage-ws";
pub const YOUTUBE_SOCKET: &str = "recipe-from-youtube-ws";
pub const IMAGES_SOCKET: &str = "recipe-from-images-ws";

pub fn escape(text: &str) -> String {
    encode_text(text).into_owned()
}

/// Fill `{{key}}` placeholders in a single pass over `template`.
///
/// Inserted values are never scanned again, so placeholder text inside them
/// stays literal. Unknown placeholders are kept as they are.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut filled = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        filled.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let value = after.find("}}").and_then(|end| {
            let key = &after[..end];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, end))
        });
        match value {
            Some((value, end)) => {
                filled.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                filled.push_str("{{");
                rest = after;
            }
        }
    }
    filled.push_str(rest);
    filled
}

pub fn index_page(recipes: &[Recipe]) -> String {
    let method = recipe_method();
    let list = recipe_list(None, recipes);
    fill(INDEX, &[("recipe_method", method.as_str()), ("recipes", list.as_str())])
}

pub fn recipe_page(recipe: &Recipe) -> String {
    let title = escape(&recipe.name);
    let summary = escape(&recipe.summary);
    let content = recipe.to_html();
    fill(
        RECIPE_PAGE,
        &[
            ("title", title.as_str()),
            ("summary", summary.as_str()),
            ("content", content.as_str()),
        ],
    )
}

/// Buttons choosing how to create a recipe
pub fn recipe_method() -> String {
    let button = |route: &str, label: &str| {
        format!(
            r##"<button hx-get="{route}" hx-target="#recipe-form">{label}</button>"##
        )
    };
    format!(
        r#"<div id="recipe-method">{}{}{}{}</div>"#,
        button("/description-div", "Describe a dish"),
        button("/webpage-div", "From a web page"),
        button("/youtube-div", "From a YouTube video"),
        button("/images-div", "From photos"),
    )
}

/// A method form, hiding the method picker
fn method_form(form: String) -> String {
    format!(r#"{form}<div id="recipe-method" hx-swap-oob="true"></div>"#)
}

fn text_form(div_id: &str, route: &str, field: &str, input: &str) -> String {
    method_form(format!(
        r##"<div id="{div_id}">
  <form hx-post="{route}" hx-target="#{div_id}" hx-swap="outerHTML">
    {input}
    <button type="submit">Create recipe</button>
  </form>
</div>"##,
        input = input.replace("{field}", field),
    ))
}

pub fn description_form() -> String {
    text_form(
        "description-div",
        "/description",
        "description",
        r#"<textarea id="description" name="{field}" rows="4" placeholder="Describe a dish, links welcome ..."></textarea>"#,
    )
}

pub fn webpage_form() -> String {
    text_form(
        "webpage-div",
        "/webpage",
        "webpage-url",
        r#"<input id="webpage-url" name="{field}" type="url" placeholder="Web page url ...">"#,
    )
}

pub fn youtube_form() -> String {
    text_form(
        "youtube-div",
        "/youtube",
        "youtube-url",
        r#"<input id="youtube-url" name="{field}" type="url" placeholder="YouTube url ...">"#,
    )
}

pub fn images_form() -> String {
    method_form(
        r##"<div id="images-div">
  <form hx-post="/images" hx-target="#images-div" hx-swap="outerHTML" hx-encoding="multipart/form-data">
    <input id="images" name="images" type="file" accept="image/*" multiple>
    <button type="submit">Create recipe</button>
  </form>
</div>"##
            .to_string(),
    )
}

/// Empty the submitted form and open the WebSocket that streams the recipe
pub fn socket_started(form_id: &str, socket_id: &str, route: &str, query: &str) -> String {
    let target = format!("{route}?{query}");
    format!(
        r#"<div id="{form_id}"></div>
<div id="{socket_id}" hx-swap-oob="true" hx-ext="ws" ws-connect="{}"></div>"#,
        encode_double_quoted_attribute(&target)
    )
}

pub fn clear_socket(socket_id: &str) -> String {
    format!(r#"<div id="{socket_id}" hx-swap-oob="true"></div>"#)
}

/// Replace the recipe panel with already escaped HTML
pub fn recipe_content(inner: &str) -> String {
    format!(r#"<div id="recipe-content" hx-swap-oob="true">{inner}</div>"#)
}

pub fn progress(event: &Progress) -> String {
    let inner = match event {
        Progress::ReadingLinks => "<div>Reading the description ...</div>".to_string(),
        Progress::ResolvingSource(source) => {
            format!("<div>Grabbing content for {} ...</div>", escape(source))
        }
        Progress::SourceResolved { source, text } => format!(
            "<div>Grabbing recipe from the content of {} ...</div><br/><div>{}</div>",
            escape(source),
            escape(text)
        ),
        Progress::WritingRecipe => "<div>Grabbing recipe ...</div>".to_string(),
        Progress::NamingRecipe => "<div>Naming the recipe ...</div>".to_string(),
        Progress::StoringRecipe => "<div>Saving the recipe ...</div>".to_string(),
    };
    recipe_content(&inner)
}

/// The finished recipe, optionally followed by what it was made from
pub fn recipe_result(recipe: &Recipe, origin: Option<(&str, &str)>) -> String {
    let mut inner = format!(
        r#"<h2><a href="/recipes/{}">{}</a></h2><p class="summary">{}</p><div>{}</div>"#,
        escape(&recipe.id),
        escape(&recipe.name),
        escape(&recipe.summary),
        recipe.to_html()
    );
    if let Some((label, text)) = origin {
        inner.push_str(&format!(
            "<br/><div>From the {} ...</div><div>{}</div>",
            escape(label),
            escape(text)
        ));
    }
    recipe_content(&inner)
}

pub fn failure(action: &str, err: &ColunchError) -> String {
    recipe_content(&format!(
        r#"<div class="error">Could not {}</div><div>{}</div>"#,
        escape(action),
        escape(&err.to_string())
    ))
}

pub fn error_message(err: &ColunchError) -> String {
    format!(r#"<div class="error">{}</div>"#, escape(&err.to_string()))
}

/// Recipe links, with an optional caption such as the phrase searched for
pub fn recipe_list(caption: Option<&str>, recipes: &[Recipe]) -> String {
    let mut out = String::from(r#"<div id="recipe-list">"#);
    if let Some(caption) = caption {
        out.push_str(&format!(r#"<p class="phrase">{}</p>"#, escape(caption)));
    }
    if recipes.is_empty() {
        out.push_str("<p>No recipes yet.</p>");
    } else {
        out.push_str("<ul>");
        for recipe in recipes {
            out.push_str(&format!(
                r#"<li><a href="/recipes/{}">{}</a> <span class="summary">{}</span></li>"#,
                escape(&recipe.id),
                escape(&recipe.name),
                escape(&recipe.summary)
            ));
        }
        out.push_str("</ul>");
    }
    out.push_str("</div>");
    out
}
