// Export all route modules
pub mod earnings;
pub mod jobs;
pub mod leads;

// Re-export all route handlers for easy importing
pub use earnings::*;
pub use jobs::*;
pub use leads::*;
