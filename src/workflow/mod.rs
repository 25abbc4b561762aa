pub mod feature_ctx;
pub mod feature_flow;

pub use feature_ctx::FeatureCtx;
pub use feature_flow::{FeatureFlow, FeatureOutcome};
