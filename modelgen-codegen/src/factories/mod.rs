//! Built-in factories.

mod listing;
mod template;

pub use listing::ListingFactory;
pub use template::{
    FILE_ARTIFACT, PARAMETERIZED_TEMPLATE, PATH_ATTRIBUTE, PRODUCER_ATTRIBUTE, TARGET_FILE,
    TargetFile, TargetFileListProducer, TemplateFactory,
};
