//! Blockwatch Moderation
//!
//! The asynchronous content-moderation pipeline:
//! - The `Classifier` trait and the bundled text/media classifiers
//! - The composite `ContentScreen` (logical AND over sub-checks, with the
//!   classification deadline)
//! - The `ModerationOrchestrator` driving items from `pending` to a terminal
//!   state and fanning the outcome out
//! - The `ContentService` creation boundary
//!
//! Classification never blocks the creation path: reviews run as detached
//! background tasks and every failure resolves deny-by-default.

pub mod classifier;
pub mod lexicon;
pub mod media;
pub mod orchestrator;
pub mod screen;
pub mod service;

pub use classifier::{Classifier, Verdict};
pub use lexicon::LexiconClassifier;
pub use media::MediaLocatorClassifier;
pub use orchestrator::ModerationOrchestrator;
pub use screen::{ContentScreen, DEFAULT_TIMEOUT};
pub use service::{ContentService, MediaUpload, NewComment, NewPost};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{Classifier, Verdict};
    pub use crate::lexicon::LexiconClassifier;
    pub use crate::media::MediaLocatorClassifier;
    pub use crate::orchestrator::ModerationOrchestrator;
    pub use crate::screen::ContentScreen;
    pub use crate::service::{ContentService, NewComment, NewPost};
}
