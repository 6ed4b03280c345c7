//! Filesystem layout and I/O for KB documents and recommendation files

mod io;
mod paths;

pub use io::{atomic_write, load_recent_markdown, markdown_file_names, read_lossy};
pub use paths::{Paths, RECOMMENDATIONS_DIR_NAME};
