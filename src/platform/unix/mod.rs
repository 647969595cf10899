//! Unix-specific platform implementations

mod filesystem;
mod process;

pub use filesystem::UnixFilesystem;
pub use process::UnixProcessTree;
