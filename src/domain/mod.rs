pub mod envelope;
pub mod event;

pub use envelope::*;
pub use event::*;
