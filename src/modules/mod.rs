//! Modules layer - Infrastructure shared by features
//!
//! Holds the object storage client for report photos.

pub mod storage;
