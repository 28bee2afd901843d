// Completion signal detection
//
// The Reflect gate needs to decide whether the model considers the run
// finished. The contract is a trait so the textual marker check can be
// swapped for a structured completion flag without touching the loop.

use crate::message::Message;

/// Decides whether a reflection reply signals that the run is complete
pub trait CompletionClassifier: Send + Sync {
    fn is_complete(&self, message: &Message) -> bool;
}

/// Classifier that looks for a literal completion marker in the reply text.
///
/// Matching is case-insensitive. The reflection prompt asks the model to say
/// "DONE" when the question is fully answered.
pub struct DoneMarkerClassifier {
    marker: String,
}

impl DoneMarkerClassifier {
    /// Create a classifier with a custom marker
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into().to_lowercase(),
        }
    }
}

impl Default for DoneMarkerClassifier {
    fn default() -> Self {
        Self::new("done")
    }
}

impl CompletionClassifier for DoneMarkerClassifier {
    fn is_complete(&self, message: &Message) -> bool {
        message.content.to_lowercase().contains(&self.marker)
    }
}
