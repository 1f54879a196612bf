//! Tree-sitter powered syntax services for the loom weaving toolchain.
//!
//! The weaving engine itself works on plain text offsets. This crate supplies
//! the few places where it needs to understand the bundle it is rewriting:
//!
//! - **Parsing and validation** via [`Parser`] and [`ParseResult`], used to
//!   check that a rewritten bundle still parses.
//! - **Function location** via [`FunctionLocator`], which resolves a
//!   [`BindingPath`] such as `Car.prototype.update` to the byte range of the
//!   declaration that binds it.
//! - **Identifier renaming** via [`rename_identifier`], which rewrites a
//!   callback's receiver parameter to `this` at the token level.
//!
//! # Supported Languages
//!
//! - JavaScript (`.js`, `.mjs`, `.cjs`, `.jsx`)
//! - TypeScript (`.ts`, `.tsx`, `.mts`, `.cts`)
//!
//! # Example
//!
//! ```
//! use loom_syntax::{BindingPath, FunctionLocator, Parser, SupportedLanguage};
//!
//! let mut parser = Parser::new(SupportedLanguage::JavaScript)?;
//! let parsed = parser.parse(
//!     "class Car { update(dt) { this.x += dt; } static update() { return 0; } }",
//! )?;
//!
//! // The instance method, not its static namesake.
//! let target: BindingPath = "Car.prototype.update".parse().unwrap_or_default();
//! let sites = FunctionLocator::new().find(&parsed, &target);
//! assert_eq!(sites.len(), 1);
//! # Ok::<(), loom_syntax::SyntaxError>(())
//! ```

mod error;
mod language;
mod locator;
mod parser;
mod rename;

pub use error::SyntaxError;
pub use language::{LanguageParseError, SupportedLanguage};
pub use locator::{Accessor, BindingPath, FunctionKind, FunctionLocator, FunctionSite};
pub use parser::{Diagnostic, ParseResult, Parser};
pub use rename::{RenameOutcome, rename_identifier};
