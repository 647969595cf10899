//! Windows-specific platform implementations

mod filesystem;
mod process;

pub use filesystem::WindowsFilesystem;
pub use process::WindowsProcessTree;
