pub mod analysis;
pub mod distribution;
pub mod etl;
pub mod pipeline;

pub use crate::domain::model::{ReportBundle, SurveyRecord};
pub use crate::domain::ports::{ConfigProvider, FeedbackRepository, Pipeline, SourceSpec, Storage};
pub use crate::utils::error::Result;
