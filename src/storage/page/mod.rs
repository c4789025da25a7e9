//! Page frames and content buffers.
//!
//! This module contains:
//! - [`Page`] - A frame slot: content plus identity, pin count, dirty flag
//! - [`PageBuf`] - The raw 4KB aligned content container

#[allow(clippy::module_inception)]
mod page;
mod page_buf;

pub use page::Page;
pub use page_buf::PageBuf;
