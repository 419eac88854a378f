pub mod completion;

pub use completion::Completion;
