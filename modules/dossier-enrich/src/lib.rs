pub mod clock;
pub mod enricher;
pub mod gaps;
pub mod keys;
pub mod limiter;
pub mod merge;
pub mod source;
pub mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use enricher::{EnrichConfig, EnrichSummary, Enricher, GapOutcome, Interrupt};
pub use gaps::{find_gaps, Gap};
pub use keys::KeyRing;
pub use limiter::RateLimiter;
pub use merge::{apply, EnrichmentResult};
pub use source::{EnrichmentSource, RetryPolicy, UrlscanSource};
