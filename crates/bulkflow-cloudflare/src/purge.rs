//! DNS purge: the record listing source and the delete action

use crate::dns::{CloudflareDns, DEFAULT_PER_PAGE, DnsRecord};
use async_trait::async_trait;
use bulkflow_core::{ActionError, ListingError, RemoteAction, WorkSource};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lists every DNS record of the zone
///
/// Deleting records shifts Cloudflare's page boundaries, so the whole
/// listing is fetched (following `total_pages`) before the first record is
/// handed out. Pages are then yielded in listing order.
///
/// When a page request fails, the pages fetched before it are still yielded
/// and the listing error is returned once they run out.
pub struct DnsRecordSource {
    dns: Arc<CloudflareDns>,
    per_page: u32,
    record_type: Option<String>,
    pages: Option<VecDeque<Vec<DnsRecord>>>,
    failure: Option<ListingError>,
}

impl DnsRecordSource {
    pub fn new(dns: Arc<CloudflareDns>) -> Self {
        Self {
            dns,
            per_page: DEFAULT_PER_PAGE,
            record_type: None,
            pages: None,
            failure: None,
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Only list records of this type (e.g., "A", "TXT")
    pub fn with_record_type(mut self, record_type: Option<String>) -> Self {
        self.record_type = record_type.map(|t| t.to_ascii_uppercase());
        self
    }

    /// Fetch every page, stopping at the first failed request
    async fn snapshot(&self) -> (VecDeque<Vec<DnsRecord>>, Option<ListingError>) {
        let mut pages = VecDeque::new();
        let mut page = 1;

        loop {
            let listed = match self
                .dns
                .list_records_page(page, self.per_page, self.record_type.as_deref())
                .await
            {
                Ok(listed) => listed,
                Err(e) => {
                    warn!(
                        zone_id = self.dns.zone_id(),
                        page,
                        listed_pages = pages.len(),
                        error = %e,
                        "DNS record listing failed"
                    );
                    return (pages, Some(ListingError::page(page, e)));
                }
            };

            debug!(
                zone_id = self.dns.zone_id(),
                page,
                total_pages = listed.total_pages,
                records = listed.records.len(),
                "Listed DNS records"
            );

            let last = listed.records.is_empty() || page >= listed.total_pages;
            if !listed.records.is_empty() {
                pages.push_back(listed.records);
            }
            if last {
                break;
            }
            page += 1;
        }

        info!(
            zone_id = self.dns.zone_id(),
            records = pages.iter().map(Vec::len).sum::<usize>(),
            "DNS record listing complete"
        );
        (pages, None)
    }
}

#[async_trait]
impl WorkSource for DnsRecordSource {
    type Item = DnsRecord;

    fn name(&self) -> &str {
        "cloudflare-dns"
    }

    async fn next_page(&mut self) -> Result<Option<Vec<DnsRecord>>, ListingError> {
        if self.pages.is_none() {
            let (pages, failure) = self.snapshot().await;
            self.pages = Some(pages);
            self.failure = failure;
        }

        match self.pages.as_mut().and_then(VecDeque::pop_front) {
            Some(page) => Ok(Some(page)),
            None => self.failure.take().map_or(Ok(None), Err),
        }
    }
}

/// Deletes one DNS record
pub struct DeleteDnsRecord {
    dns: Arc<CloudflareDns>,
    dry_run: bool,
}

impl DeleteDnsRecord {
    pub fn new(dns: Arc<CloudflareDns>) -> Self {
        Self {
            dns,
            dry_run: false,
        }
    }

    /// Report what would be deleted without calling the API
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[async_trait]
impl RemoteAction<DnsRecord> for DeleteDnsRecord {
    async fn apply(&self, record: &DnsRecord) -> Result<String, ActionError> {
        if self.dry_run {
            return Ok(format!("Would delete {} -> {}", record.name, record.content));
        }
        self.dns.delete_record(&record.id).await?;
        Ok(format!("Deleted {} -> {}", record.name, record.content))
    }
}
