pub mod archive;
pub mod blocklist;
pub mod dns;
pub mod lookup;
pub mod recon;
pub mod subdomains;
pub mod urlscan;
pub mod virustotal;
pub mod whois;

pub use archive::{read_urls, Archive, ArchiveStatus};
pub use blocklist::{Blocklist, BlocklistSource};
pub use dns::{DnsLookup, DnsRecords};
pub use lookup::{Lookup, LookupOutcome};
pub use recon::{load_targets, standard_lookups, write_json, Recon, ReconSummary};
pub use subdomains::SubdomainLookup;
pub use urlscan::ScanLookup;
pub use virustotal::ReputationLookup;
pub use whois::{bulk_email, export_csv, read_emails, BulkEmailResults, BulkEmailSummary, EmailDomains};
