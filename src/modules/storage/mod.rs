//! Object storage for report photos

mod minio_client;

pub use minio_client::MinIOClient;
