mod batch;
mod coordinator;
mod selection;
mod types;

pub use coordinator::BatchCoordinator;
pub use selection::FileSelector;
pub use types::{Collection, SelectedFile};
