// Procurement Radar - Library
// Norwegian procurement notices filtered by SSB classification hierarchies

pub mod classification; // NUTS / STYRK hierarchies, resolver, registry
pub mod cpv;            // Static CPV vocabulary
pub mod error;
pub mod logging;
pub mod procurement;    // Doffin search
pub mod ssb;            // KLASS CSV source
pub mod validation;

#[cfg(feature = "server")]
pub mod config;
#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used items
pub use classification::{
    ClassificationRecord, FilterResolver, HierarchyIndex, HierarchyQueryService,
    PublishOutcome, Scheme, SchemeRegistry,
};

pub use error::{ClassificationError, Result};

pub use procurement::{
    NoticeSearch, NoticeStatus, ProcurementSearchService, ResolvedSearch, SearchError,
    SearchOutcome, SearchRequest,
};

pub use ssb::{load_file, read_records, SourceError};

pub use validation::ValidationError;
