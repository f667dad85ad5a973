//! Repository methods on [`PageDb`](crate::PageDb), one module per table group.

pub mod changelog;
pub mod page;
pub mod peptide;
pub mod section;
pub mod study;
