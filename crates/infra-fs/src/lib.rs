// Snapbridge Infrastructure - Filesystem Adapters
// Implements: ArtifactStore, CommandChannel

mod artifact_store;
mod command_channel;

pub use artifact_store::FsArtifactStore;
pub use command_channel::{FileCommandChannel, QUEUE_FILE_NAME, STATUS_FILE_NAME};
