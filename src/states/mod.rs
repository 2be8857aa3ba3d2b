pub mod debounce;
pub mod playground;
pub mod store;

pub use playground::{InputFormat, OutputFormat, PlaygroundState, Selection};
pub use store::{StateStore, ViewInvalidation};
