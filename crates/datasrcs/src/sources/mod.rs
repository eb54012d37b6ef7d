//! Concrete data sources.

pub mod binaryedge;
pub mod crtsh;
pub mod hackertarget;

pub use binaryedge::BinaryEdge;
pub use crtsh::CrtSh;
pub use hackertarget::HackerTarget;

use crate::http::HttpClient;
use crate::service::QueryService;
use shared_types::ScanConfig;
use std::sync::Arc;

/// Build one instance of every built-in source.
pub fn all_sources(config: &Arc<ScanConfig>, http: &HttpClient) -> Vec<Arc<dyn QueryService>> {
    vec![
        Arc::new(BinaryEdge::new(Arc::clone(config), http.clone())),
        Arc::new(CrtSh::new(Arc::clone(config), http.clone())),
        Arc::new(HackerTarget::new(Arc::clone(config), http.clone())),
    ]
}
