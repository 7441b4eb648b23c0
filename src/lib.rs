//! study library crate: content, timeline, scoring and analysis for the
//! program-comprehension study.
//!
//! The `study` binary (crates/study-cli) and the terminal presenter
//! (crates/study-tui) are thin layers over these modules. Integration tests
//! drive [`engine::Engine`] directly with a scripted presenter.

pub mod analysis;
pub mod assets;
pub mod capture;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod timeline;
pub mod trial;

pub use capture::{AnswerCapture, ParticipantAnswer, parse_integer};
pub use catalog::{Catalog, Complexity, ProblemDescriptor};
pub use engine::{Completion, Engine, Presenter};
pub use error::StudyError;
pub use record::{ResultRecord, SessionLog};
pub use timeline::Timeline;
pub use trial::Trial;
