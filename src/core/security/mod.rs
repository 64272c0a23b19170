// Security module for path containment checks
//
// Tool directories are only admitted when they resolve inside the tool
// source root, so a symlinked directory cannot pull files from elsewhere.

pub mod path_validator;

pub use path_validator::{PathSecurityError, ensure_within_root};
