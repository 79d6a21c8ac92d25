//! Rendering formatted documents to files.
//!
//! A [`FormattedDocument`](crate::models::FormattedDocument) is first turned
//! into an [`Outline`], the one structure every converter renders from, so
//! all of them produce the same headings in the same order. The
//! [`DocumentAssembler`] tries its converters in order:
//!
//! 1. [`PandocConverter`]: the external `pandoc` binary, fed markdown on stdin
//! 2. [`DocxWriter`]: a built-in minimal OOXML writer (`zip` + `quick-xml`)

mod assembler;
mod docx;
mod outline;
mod pandoc;

pub use assembler::{
    default_file_name, AssemblyError, ConverterError, DocumentAssembler, DocumentConverter,
};
pub use docx::DocxWriter;
pub use outline::{Block, Outline, ABSTRACT_HEADING, REFERENCES_HEADING};
pub use pandoc::PandocConverter;

#[cfg(test)]
pub(crate) use docx::tests::docx_headings;
