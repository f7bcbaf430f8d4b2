//! The seam to the external Type Registry Service.
//!
//! The actual OS type/handler database (UTI semantics, Info.plist parsing,
//! the installed-application scan) lives behind [`TypeRegistry`]; this crate
//! only depends on the shape of these calls. [`memory::MemoryRegistry`]
//! provides a deterministic in-process implementation for tests and
//! harnesses.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;

/// What a handler lookup targets: a document type or a URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerTarget<'a> {
	Uti(&'a str),
	Scheme(&'a str),
}

impl HandlerTarget<'_> {
	#[must_use]
	pub const fn value(&self) -> &str {
		match self {
			Self::Uti(uti) => uti,
			Self::Scheme(scheme) => scheme,
		}
	}
}

impl fmt::Display for HandlerTarget<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Uti(uti) => write!(f, "type '{uti}'"),
			Self::Scheme(scheme) => write!(f, "scheme '{scheme}'"),
		}
	}
}

/// An installed application as reported by the registry.
///
/// `name` and `bundle_id` are derived attributes and may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
	pub name: String,
	pub path: PathBuf,
	pub bundle_id: String,
}

/// A raw document-type record from an application manifest, before any
/// derivation or filtering.
///
/// Absent fields are meaningful: a missing `handler_rank` is a distinct
/// state from any rank string, and `content_types` being empty triggers
/// derivation from `legacy_extensions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredDocumentType {
	pub type_name: Option<String>,
	pub role: Option<String>,
	pub handler_rank: Option<String>,
	pub content_types: Vec<String>,
	pub legacy_extensions: Vec<String>,
	pub is_package: Option<bool>,
}

/// Error domain/code the OS reports when the user dismisses the
/// change-default confirmation prompt.
pub const USER_CANCELLED_DOMAIN: &str = "NSCocoaErrorDomain";
pub const USER_CANCELLED_CODE: i64 = 3072;

/// Failure outcome of an asynchronous set-default mutation.
///
/// The description/domain/code triple is preserved verbatim in the display
/// string for debuggability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{description} (domain: {domain}, code: {code})")]
pub struct CompletionError {
	pub description: String,
	pub domain: String,
	pub code: i64,
}

impl CompletionError {
	#[must_use]
	pub fn user_cancelled() -> Self {
		Self {
			description: "The operation was cancelled".into(),
			domain: USER_CANCELLED_DOMAIN.into(),
			code: USER_CANCELLED_CODE,
		}
	}

	#[must_use]
	pub fn is_user_cancelled(&self) -> bool {
		self.domain == USER_CANCELLED_DOMAIN && self.code == USER_CANCELLED_CODE
	}
}

/// One-shot completion callback for [`TypeRegistry::begin_set_default_handler`].
///
/// The registry may invoke it from any thread, exactly once, or never.
pub type CompletionHandler = Box<dyn FnOnce(Result<(), CompletionError>) + Send + 'static>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
	#[error("unknown type identifier: '{0}'")]
	UnknownType(String),
	#[error("cannot read declared document types of '{}': {reason}", path.display())]
	ManifestUnreadable { path: PathBuf, reason: String },
	#[error("{0}")]
	Failure(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// The external oracle mapping types/schemes/extensions to applications and
/// back.
///
/// All lookups are reads against registry state owned elsewhere; the only
/// mutation is [`begin_set_default_handler`](Self::begin_set_default_handler),
/// which completes asynchronously and may involve a user-facing prompt.
/// Implementations hold no state on behalf of this crate and must be safe to
/// call concurrently.
pub trait TypeRegistry: Send + Sync {
	/// The current default handler for `target`, if any is registered.
	///
	/// Returns `Err(UnknownType)` for a type identifier the registry does
	/// not recognize, as opposed to `Ok(None)` for a recognized type with
	/// no current default.
	fn lookup_default_handler(&self, target: HandlerTarget<'_>) -> RegistryResult<Option<PathBuf>>;

	/// Every application capable of handling `target`. An empty list is a
	/// legitimate registry state.
	fn lookup_capable_handlers(&self, target: HandlerTarget<'_>) -> RegistryResult<Vec<PathBuf>>;

	/// Type identifiers matching a filename extension, ordered by
	/// registry-assigned specificity.
	fn lookup_types_for_extension(&self, extension: &str) -> RegistryResult<Vec<String>>;

	/// The full extension-tag list of a type. Unknown identifiers yield an
	/// empty list; distinguishing them from extension-less types is not
	/// required.
	fn lookup_extensions_for_type(&self, uti: &str) -> RegistryResult<Vec<String>>;

	/// The preferred filename extension of a type, if it declares one.
	fn lookup_preferred_extension(&self, uti: &str) -> RegistryResult<Option<String>>;

	/// Every installed application known to the registry.
	fn installed_applications(&self) -> RegistryResult<Vec<AppInfo>>;

	/// The raw document-type records declared in the manifest of the
	/// application at `app_path`.
	fn declared_document_types(&self, app_path: &Path)
		-> RegistryResult<Vec<DeclaredDocumentType>>;

	/// Start assigning `app_path` as the default handler for `target`.
	///
	/// Returns immediately; `on_complete` is invoked once the OS resolves
	/// the mutation (possibly after user interaction), or never if the
	/// operation stalls.
	fn begin_set_default_handler(
		&self,
		app_path: &Path,
		target: HandlerTarget<'_>,
		on_complete: CompletionHandler,
	);
}

impl<R: TypeRegistry + ?Sized> TypeRegistry for Box<R> {
	fn lookup_default_handler(&self, target: HandlerTarget<'_>) -> RegistryResult<Option<PathBuf>> {
		(**self).lookup_default_handler(target)
	}

	fn lookup_capable_handlers(&self, target: HandlerTarget<'_>) -> RegistryResult<Vec<PathBuf>> {
		(**self).lookup_capable_handlers(target)
	}

	fn lookup_types_for_extension(&self, extension: &str) -> RegistryResult<Vec<String>> {
		(**self).lookup_types_for_extension(extension)
	}

	fn lookup_extensions_for_type(&self, uti: &str) -> RegistryResult<Vec<String>> {
		(**self).lookup_extensions_for_type(uti)
	}

	fn lookup_preferred_extension(&self, uti: &str) -> RegistryResult<Option<String>> {
		(**self).lookup_preferred_extension(uti)
	}

	fn installed_applications(&self) -> RegistryResult<Vec<AppInfo>> {
		(**self).installed_applications()
	}

	fn declared_document_types(
		&self,
		app_path: &Path,
	) -> RegistryResult<Vec<DeclaredDocumentType>> {
		(**self).declared_document_types(app_path)
	}

	fn begin_set_default_handler(
		&self,
		app_path: &Path,
		target: HandlerTarget<'_>,
		on_complete: CompletionHandler,
	) {
		(**self).begin_set_default_handler(app_path, target, on_complete);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn completion_error_preserves_triple() {
		let err = CompletionError {
			description: "The file doesn't exist".into(),
			domain: "NSOSStatusErrorDomain".into(),
			code: -10814,
		};
		assert_eq!(
			err.to_string(),
			"The file doesn't exist (domain: NSOSStatusErrorDomain, code: -10814)"
		);
		assert!(!err.is_user_cancelled());
		assert!(CompletionError::user_cancelled().is_user_cancelled());
	}

	#[test]
	fn target_display() {
		assert_eq!(HandlerTarget::Uti("public.html").to_string(), "type 'public.html'");
		assert_eq!(HandlerTarget::Scheme("mailto").to_string(), "scheme 'mailto'");
		assert_eq!(HandlerTarget::Scheme("http").value(), "http");
	}
}
