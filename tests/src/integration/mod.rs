//! Cross-crate flows between in-process platforms.

mod flows;
