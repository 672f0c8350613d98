//! Cloudflare DNS purge for BulkFlow
//!
//! Lists every DNS record of a zone through the Cloudflare API and deletes
//! them through the BulkFlow pipeline.
//!
//! The API token needs DNS edit permission on the zone.
//!
//! # Example
//!
//! ```ignore
//! use bulkflow_cloudflare::{CloudflareDns, DeleteDnsRecord, DnsConfig, DnsRecordSource};
//! use bulkflow_core::PipelineConfig;
//! use std::sync::Arc;
//!
//! let dns = Arc::new(CloudflareDns::new(DnsConfig::new(api_token, zone_id))?);
//! let source = DnsRecordSource::new(Arc::clone(&dns)).with_record_type(Some("TXT".into()));
//! let action = DeleteDnsRecord::new(dns);
//!
//! let result = bulkflow_core::run(source, action, &PipelineConfig::default()).await?;
//! ```

pub mod dns;
pub mod error;
pub mod purge;

pub use dns::{CloudflareDns, DnsConfig, DnsRecord, RecordPage};
pub use error::{CloudflareError, Result};
pub use purge::{DeleteDnsRecord, DnsRecordSource};
