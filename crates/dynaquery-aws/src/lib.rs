//! DynamoDB connection glue for dynaquery.
//!
//! [`AwsConfig`] resolves region, credential profile and endpoint override;
//! [`DynamoDbBackend`] implements [`QueryBackend`](dynaquery_core::QueryBackend)
//! on top of the AWS SDK client built from it.
#![allow(clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;

pub use backend::DynamoDbBackend;
pub use config::AwsConfig;
