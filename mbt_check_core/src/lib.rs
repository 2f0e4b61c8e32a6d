//! `mbt_check_core` is the core library for `mbt-check`, a tool that keeps the
//! MoonBit samples of literate markdown documents (`*.mbt.md`) compiling. It
//! extracts MoonBit code fences, groups them by their conditional-inclusion
//! tags, writes one package per group into a temporary `moon` module and
//! drives `moon check` / `moon test` against it.
//!
//! ## Processing Pipeline
//!
//! ```text
//! *.mbt.md documents
//!   → Scanner (markdown AST → MoonBit fences with line spans)
//!   → Directives (`skip`, `no-check`, `test`, `unless=a,b` folded per fence)
//!   → Groups (blocks per key; the `_` baseline is appended to every other group)
//!   → Materializer (one package directory per group + moon.mod.json + source map)
//!   → Checker (moon check, then moon test)
//! ```
//!
//! ## Fence directives
//!
//! ````markdown
//! ```mbt
//! fn helper() -> Int { 1 }        // baseline group `_`
//! ```
//!
//! ```mbt test
//! assert_eq(helper(), 1)         // wrapped in `test { ... }`
//! ```
//!
//! ```mbt unless=js,wasm
//! fn native_only() -> Unit { () } // only in groups `js` and `wasm`
//! ```
//!
//! ```mbt skip
//! this does not compile          // never extracted
//! ```
//! ````
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::path::PathBuf;
//!
//! use mbt_check_core::Checker;
//! use mbt_check_core::MaterializeOptions;
//! use mbt_check_core::generate_project;
//!
//! let documents = vec![PathBuf::from("docs/intro.mbt.md")];
//! let root = Path::new("target/moonbit-check");
//! let (_, tree) = generate_project(&documents, root, &MaterializeOptions::default()).unwrap();
//!
//! let report = Checker::moon(&tree.root).check(true).unwrap();
//! if let Some(failure) = report.failure() {
//!     eprintln!("{}", tree.source_map.rewrite(&failure.stderr));
//! }
//! ```

pub use checker::*;
pub use config::*;
pub use directive::*;
pub use error::*;
pub use group::*;
pub use materialize::*;
pub use scanner::*;
pub use source_map::*;
pub use workspace::*;

mod checker;
pub mod config;
mod directive;
#[allow(unused_assignments)]
mod error;
mod group;
mod materialize;
mod scanner;
mod source_map;
mod workspace;
