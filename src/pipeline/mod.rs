//! Pipeline stages for image-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step and is tested
//! on its own.
//!
//! ## Data Flow
//!
//! ```text
//!                                  ┌──▶ document ──▶ converted_<uuid>.pdf
//! validate ──▶ page ───────────────┤
//! (rules)      (decode, fit, embed) └──▶ archive  ──▶ converted_pdfs_<uuid>.zip
//! ```
//!
//! 1. [`validate`]: batch-level checks, first violation wins; no decoding
//! 2. [`layout`]: pure scale-to-fit arithmetic on an A4 page
//! 3. [`encode`]: turn decoded pixels into an image XObject payload
//! 4. [`page`]: decode one upload and combine layout + encode
//! 5. [`document`]: append placed pages to one PDF (single-document mode)
//! 6. [`archive`]: one PDF per image, zipped (archive mode)

pub mod archive;
pub mod document;
pub mod encode;
pub mod layout;
pub mod page;
pub mod validate;

pub use validate::validate;
