mod progress;
mod recipe;

pub use progress::{Progress, ProgressSender};
pub use recipe::{RecipeBook, RecipeSettings};

pub(crate) use progress::report;
