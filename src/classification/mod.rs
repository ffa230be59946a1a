// Classification hierarchies (NUTS geography, STYRK occupations)

pub mod index;
pub mod record;
pub mod registry;
pub mod resolver;
pub mod scheme;
pub mod service;

pub use index::{primary_name, HierarchyIndex, HierarchyNode, NestedNode};
pub use record::{fingerprint, ClassificationRecord};
pub use registry::{PublishOutcome, SchemeRegistry};
pub use resolver::FilterResolver;
pub use scheme::{LabeledChildren, ParseSchemeError, Scheme, SchemeNode};
pub use service::{CodeDetail, CodeEntry, HierarchyQueryService, SnapshotInfo};
