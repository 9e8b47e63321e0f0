pub mod error;
pub mod grid;
pub mod store;

pub use error::CheckpointError;
pub use grid::{Dimension, Unit, Units, WorkGrid};
pub use store::{Checkpoint, CheckpointStore, CHECKPOINT_FILE_NAME};
