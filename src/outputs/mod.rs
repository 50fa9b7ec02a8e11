//! Persistence for the per-date cache and report files.
//!
//! # File Layout
//!
//! ```text
//! storage/pharma-news/
//! ├── 2024-05-01.json          # DailyCache
//! └── 2024-05-01.report.json   # Report
//! public/pharma-news/
//! └── 2024-05-01.report.json   # optional copy written by `report --public`
//! ```
//!
//! All files are UTF-8, 2-space indented JSON with non-ASCII characters
//! written literally.

pub mod json;
