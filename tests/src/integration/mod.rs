//! Cross-crate integration flows. Provider APIs are replaced by `wiremock`
//! servers; nothing here touches the network beyond localhost.

mod fixtures;

pub mod binaryedge_flows;
pub mod e2e_scan;
