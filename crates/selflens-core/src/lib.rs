pub mod error;
pub mod export;
pub mod filter;
pub mod insights;
pub mod types;
pub mod view;

pub use error::{Result, SelfLensError};
pub use export::JournalDocument;
pub use filter::{IncidentFilter, Selector};
pub use insights::{compute_insights, AverageSeverity, Insights};
pub use types::{
    Emotion, EmotionSet, Incident, IncidentContext, IncidentDraft, IncidentId, IncidentType,
    Profile, Severity, Theme,
};
pub use view::{Overlay, Screen, ViewState};
