//! # Harvest Test Suite
//!
//! Unified test crate for flows that cross crate boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs        # Shared config, bus and mock-server helpers
//!     ├── bus_flows.rs       # Concurrent publishers, delivery guarantees
//!     ├── binaryedge_flows.rs# The key-gated API source, end to end
//!     ├── source_flows.rs    # crt.sh and HackerTarget against mocks
//!     └── e2e_scan.rs        # Full runtime runs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p harvest-tests
//! cargo test -p harvest-tests integration::binaryedge_flows::
//! ```

pub mod integration;
