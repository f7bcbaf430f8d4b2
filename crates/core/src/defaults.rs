//! Default-Set Filter.
//!
//! Narrows the Document-Type Resolver output to the types an application is
//! *actually* the current system default for, per identifier, and recomputes
//! each kept descriptor's extension list from the narrowed identifier
//! subset.

use std::path::Path;

use tracing::trace;

use crate::bridge::Bridge;
use crate::doc_types::DocumentType;
use crate::error::Result;
use crate::registry::TypeRegistry;

impl<R: TypeRegistry> Bridge<R> {
	/// The subset of [`Self::supported_document_types`] for which the
	/// application is the current system default.
	///
	/// Identifiers whose default lookup fails (unknown identifier, or no
	/// default registered) are plain non-matches, never errors. The result
	/// may be empty: declaring types is no guarantee of being default for
	/// any of them.
	pub fn default_document_types(&self, app_path: &str) -> Result<Vec<DocumentType>> {
		let declared = self.supported_document_types(app_path)?;
		let app = Path::new(app_path);

		Ok(declared
			.into_iter()
			.filter_map(|doc_type| self.narrow_to_defaults(doc_type, app))
			.collect())
	}

	fn narrow_to_defaults(&self, doc_type: DocumentType, app: &Path) -> Option<DocumentType> {
		let matching: Vec<String> = doc_type
			.utis
			.iter()
			.filter(|uti| match self.default_app_for_uti(uti) {
				Ok(default) => paths_match(&default, app),
				Err(_) => false,
			})
			.cloned()
			.collect();

		if matching.is_empty() {
			trace!(type_name = %doc_type.type_name, "no identifier has this app as default");
			return None;
		}

		let extensions = self.extensions_for_utis(&matching);

		Some(DocumentType {
			utis: matching,
			extensions,
			..doc_type
		})
	}
}

/// Path-normalization equality: resolve symbolic links when both sides
/// allow it, otherwise fall back to a case-insensitive comparison, since
/// the file systems backing application bundles are commonly
/// case-insensitive.
pub(crate) fn paths_match(left: &Path, right: &Path) -> bool {
	if left == right {
		return true;
	}

	if let (Ok(left), Ok(right)) = (left.canonicalize(), right.canonicalize()) {
		return left == right;
	}

	left.to_string_lossy()
		.eq_ignore_ascii_case(&right.to_string_lossy())
}
