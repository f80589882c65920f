use tokio::sync::mpsc::UnboundedSender;

/// Pipeline stages reported while a recipe is being created
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// Separating links from the free text of a description
    ReadingLinks,
    /// Fetching or transcribing one source
    ResolvingSource(String),
    /// A source produced text
    SourceResolved { source: String, text: String },
    /// Asking the model for the recipe itself
    WritingRecipe,
    NamingRecipe,
    StoringRecipe,
}

pub type ProgressSender = UnboundedSender<Progress>;

/// Send a progress event if anyone is listening. A closed receiver is not an
/// error: the pipeline keeps going without an audience.
pub(crate) fn report(progress: Option<&ProgressSender>, event: Progress) {
    if let Some(sender) = progress {
        let _ = sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_report_without_listener() {
        report(None, Progress::WritingRecipe);
        let (sender, receiver) = unbounded_channel();
        drop(receiver);
        report(Some(&sender), Progress::WritingRecipe);
    }

    #[test]
    fn test_report_delivers() {
        let (sender, mut receiver) = unbounded_channel();
        report(Some(&sender), Progress::NamingRecipe);
        assert_eq!(receiver.try_recv().unwrap(), Progress::NamingRecipe);
    }
}
