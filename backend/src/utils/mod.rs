//! Collection of general utility functions.
//!
//! This module serves as a repository for small, reusable helper functions
//! that do not fit into other specific domain modules.

pub mod deadline;
pub mod generate_random_string;
