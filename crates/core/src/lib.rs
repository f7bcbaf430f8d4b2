//! # apphandlers-core
//!
//! Core model and algorithms for the OS default-handler registry bridge.
//!
//! The host operating system's file-type/URL-scheme handler database is an
//! external collaborator reached through the [`TypeRegistry`] trait; this
//! crate layers three things on top of it:
//!
//! - the [`Bridge`] query facade (default handler, capable handlers,
//!   extension↔type resolution, installed applications), validation-first
//!   and strictly synchronous;
//! - a synchronous adapter that turns the asynchronous, possibly
//!   user-interactive set-default mutation into a bounded blocking call;
//! - the document-type pipeline: [`Bridge::supported_document_types`]
//!   normalizes what an application *declares*, and
//!   [`Bridge::default_document_types`] narrows that to what it is
//!   *actually* the system default for.
//!
//! ## Example
//!
//! ```
//! use apphandlers_core::{Bridge, HandlerTarget, MemoryRegistry};
//!
//! let bridge = Bridge::new(
//!     MemoryRegistry::new()
//!         .with_type("public.html", Some("html"), &["html", "htm"])
//!         .with_default(HandlerTarget::Uti("public.html"), "/Applications/Safari.app"),
//! );
//!
//! let safari = bridge.default_app_for_uti("public.html").unwrap();
//! assert_eq!(safari, std::path::PathBuf::from("/Applications/Safari.app"));
//! ```

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	deprecated
)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod bridge;
mod defaults;
mod doc_types;
mod error;
pub mod registry;
mod set_default;

pub use bridge::{Bridge, DEFAULT_SET_DEFAULT_TIMEOUT};
pub use doc_types::{DocumentType, HandlerRank, Role, WILDCARD_TYPES};
pub use error::{Error, Result, ResultCode};
pub use registry::memory::{MemoryRegistry, SetDefaultBehavior};
pub use registry::{
	AppInfo, CompletionError, CompletionHandler, DeclaredDocumentType, HandlerTarget,
	RegistryError, RegistryResult, TypeRegistry, USER_CANCELLED_CODE, USER_CANCELLED_DOMAIN,
};
