//! Text transforms applied to mirrored Markdown files.
//!
//! Every transform is a pure function of its input and is idempotent on its
//! own output. [`annotate`] composes them in the canonical order and
//! [`strip`] undoes them.

pub mod backlink;
pub mod banner;
pub mod header;
pub mod pipeline;

pub use backlink::{add_backlink, backlink_line, is_backlink_line};
pub use banner::{add_banner, banner_block, remove_banner};
pub use header::{add_header, extract_metadata, has_header, header_end, strip_provenance_header};
pub use pipeline::{annotate, same_ignoring_timestamp, strip};
