pub mod fields;
pub mod logging;

pub use fields::{FieldChain, RawRecord};
pub use logging::{short_id, truncate_text};
