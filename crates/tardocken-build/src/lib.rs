//! Docker build context assembly for tardocken.
//!
//! # Build pipeline
//!
//! ```text
//! ContextArchiveBuilder::build()
//!   1. Context     ── walk <context>          → ./...            (prefix "")
//!   2. Paths       ── walk each SOURCE        → ./DEST/...       (prefix DEST)
//!   3. Dockerfile  ── replacement Dockerfile  → ./Dockerfile     (unfiltered)
//!   4. Finish      ── end-of-archive records, return the buffer
//! ```
//!
//! # Filtering
//!
//! Every walked entry passes through one [`PathFilter`]. Paths from an
//! injected tree are checked relative to their destination and at their
//! full archive location, so with `-p ../libs:vendor/libs` both `*.tmp`
//! and `vendor/libs/*.tmp` drop `./vendor/libs/x.tmp`:
//! - names in the filter list (`Dockerfile` when it is replaced) are dropped
//! - names matching an ignore rule are dropped
//! - a dropped directory is not descended into

pub mod archive;
pub mod context;
pub mod filter;

pub use archive::ArchiveWriter;
pub use context::{ContextArchiveBuilder, ContextError};
pub use filter::PathFilter;
