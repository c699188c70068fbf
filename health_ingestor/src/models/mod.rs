pub mod bucket;
pub mod date_range;
pub mod metric;
pub mod outcome;
pub mod record;

pub use bucket::{Bucket, Granularity};
pub use date_range::{ChunkSpan, DateRange};
pub use metric::{DateMerge, MetricDescriptor, MetricKind, MetricRegistry, ValueExtractor};
pub use outcome::{ApiOutcome, ChunkFailure, UpstreamErrorKind};
pub use record::{RawRecord, TimeSeries};
