//! CLI command implementations.

pub mod genmakefile;
pub mod init;
pub mod navigation;
pub mod prepare;

pub use genmakefile::{generate_makefile, GenerateOptions};
pub use init::init_project;
pub use navigation::write_navigation;
pub use prepare::prepare_page;
