pub mod analyzer;
pub mod cache;
pub mod extractor;
pub mod fetcher;
pub mod retrieval;
pub mod scorer;
pub mod style;
pub mod synthetic;
pub mod url_guard;
pub mod validation;

pub use analyzer::ComplexityAnalyzer;
pub use cache::{Clock, ManualClock, ResultCache, SystemClock};
pub use extractor::DocumentMetricsExtractor;
pub use fetcher::{FetchedPage, HeaderProfile, PageFetcher};
pub use retrieval::{HttpProxyTransport, ProxyTransport, Retrieval, RetrievalClient, RetryPolicy};
pub use scorer::{ComplexityScorer, ScoringProfile};
pub use style::{InlineStyleResolver, StyleResolver};
pub use synthetic::{KeywordOffsets, SyntheticMetricsGenerator};
pub use url_guard::UrlGuard;
pub use validation::{HttpProbeTransport, ProbeTransport, ValidationClient, ValidationSettings};
