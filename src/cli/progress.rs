//! CLI-specific progress handling for mediafire-dl
//!
//! Provides the file-count progress bar for the command-line interface.

use indicatif::{ProgressBar, ProgressStyle};

/// Creates a progress bar tracking settled vs. discovered files
pub fn create_progress_bar(total_files: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_files);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} files ({percent}%) ETA: {eta}")
            .expect("Failed to create progress style")
            .progress_chars("#>-")
    );
    pb
}

/// Progress manager for a folder mirror run
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64, message: &str) -> Self {
        let pb = create_progress_bar(total_files);

        // Print initial message to stderr
        eprintln!("{}", message);

        Self { pb }
    }
}
