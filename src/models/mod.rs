pub mod feature;
pub mod job;
pub mod label;
pub mod stats;
pub mod test_case;

pub use feature::{Feature, Priority, RawFeature};
pub use job::{JobPhase, JobState};
pub use label::Label;
pub use stats::Stats;
pub use test_case::{RawTestCase, TestCase, TestType};
