pub mod recognition;

pub use recognition::{Fragment, FragmentSource, RecognitionFeed};
