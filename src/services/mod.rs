pub mod aggregator;
pub mod enricher;
pub mod facets;
pub mod feed;
pub mod providers;
pub mod ranker;

pub use facets::{plan_facets, FacetPlan};
pub use feed::FeedPipeline;
