//! Live attendance view: ordered reconciliation onto a presentation sink.
//!
//! # Responsibility
//! - Keep rendered rows in timestamp order as change batches arrive.
//! - Render record fields into slot content.
//!
//! # See also
//! - `feed` for the sources that drive the reconciler.

pub mod memory_sink;
pub mod reconciler;
pub mod render;
pub mod sink;
