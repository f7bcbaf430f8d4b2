//! Document-Type Resolver.
//!
//! Turns the raw document-type records an application declares in its
//! manifest into normalized descriptors: derives missing type identifiers
//! from legacy extension lists, filters records claiming the wildcard root
//! types, and aggregates every extension reachable from each declared type.

use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::trace;

use crate::bridge::Bridge;
use crate::error::{Error, Result};
use crate::registry::{DeclaredDocumentType, TypeRegistry};

/// Root type identifiers that would make an application appear to support
/// every file on the system. Records claiming any of these are dropped.
pub const WILDCARD_TYPES: [&str; 3] = ["public.item", "public.data", "public.content"];

/// How an application intends to handle a document type.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum Role {
	Editor,
	Viewer,
	Shell,
	#[default]
	None,
}

/// Declared priority of an application as a handler for a type, independent
/// of whether it is the current system default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum HandlerRank {
	Owner,
	Default,
	Alternate,
	None,
}

/// A normalized document-type descriptor.
///
/// `utis` keeps manifest declaration order and is never empty; `extensions`
/// is deduplicated and sorted ascending and may be empty. A missing
/// `handler_rank` means the manifest declared none, which is distinct from
/// [`HandlerRank::None`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentType {
	pub type_name: String,
	pub role: Role,
	pub handler_rank: Option<HandlerRank>,
	pub utis: Vec<String>,
	pub extensions: Vec<String>,
	pub is_package: bool,
}

impl<R: TypeRegistry> Bridge<R> {
	/// Every document type the application at `app_path` declares it can
	/// handle, in manifest order. Zero qualifying records is success.
	pub fn supported_document_types(&self, app_path: &str) -> Result<Vec<DocumentType>> {
		if app_path.is_empty() {
			return Err(Error::InvalidApp(app_path.to_owned()));
		}

		let records = self
			.registry()
			.declared_document_types(Path::new(app_path))?;

		Ok(records
			.into_iter()
			.filter_map(|record| self.resolve_record(record))
			.collect())
	}

	fn resolve_record(&self, mut record: DeclaredDocumentType) -> Option<DocumentType> {
		let utis = if record.content_types.is_empty() {
			self.derive_utis(&record.legacy_extensions)
		} else {
			std::mem::take(&mut record.content_types)
		};

		if utis.is_empty() {
			trace!(?record.type_name, "dropping record with no usable type information");
			return None;
		}

		if utis.iter().any(|uti| WILDCARD_TYPES.contains(&uti.as_str())) {
			trace!(?record.type_name, "dropping record claiming a wildcard root type");
			return None;
		}

		let extensions = self.aggregate_extensions(&utis, &record.legacy_extensions);

		Some(DocumentType {
			type_name: record.type_name.unwrap_or_default(),
			role: record
				.role
				.as_deref()
				.and_then(|role| role.parse().ok())
				.unwrap_or_default(),
			handler_rank: record
				.handler_rank
				.as_deref()
				.and_then(|rank| rank.parse().ok()),
			utis,
			extensions,
			is_package: record.is_package.unwrap_or(false),
		})
	}

	/// Derive type identifiers from a legacy declared-extension list,
	/// preserving first-seen order. Per-extension lookup failures are
	/// swallowed; they only shrink the result.
	fn derive_utis(&self, legacy_extensions: &[String]) -> Vec<String> {
		let mut utis = Vec::new();
		for extension in legacy_extensions {
			let Ok(resolved) = self.registry().lookup_types_for_extension(extension) else {
				continue;
			};
			for uti in resolved {
				if !utis.contains(&uti) {
					utis.push(uti);
				}
			}
		}
		utis
	}

	/// Union of each identifier's preferred extension, each identifier's
	/// full extension-tag list, and the record's legacy extension list,
	/// deduplicated and sorted ascending.
	fn aggregate_extensions(&self, utis: &[String], legacy_extensions: &[String]) -> Vec<String> {
		let mut extensions = Vec::new();

		for uti in utis {
			if let Ok(Some(preferred)) = self.registry().lookup_preferred_extension(uti) {
				extensions.push(preferred);
			}
			if let Ok(tags) = self.registry().lookup_extensions_for_type(uti) {
				extensions.extend(tags);
			}
		}
		extensions.extend(legacy_extensions.iter().cloned());

		extensions.into_iter().sorted_unstable().dedup().collect()
	}

	/// Union of the registry extension-tag lists for a set of identifiers,
	/// sorted ascending. Used when narrowing descriptors to a matching
	/// identifier subset.
	pub(crate) fn extensions_for_utis(&self, utis: &[String]) -> Vec<String> {
		utis.iter()
			.filter_map(|uti| self.registry().lookup_extensions_for_type(uti).ok())
			.flatten()
			.sorted_unstable()
			.dedup()
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::registry::memory::MemoryRegistry;
	use crate::ResultCode;

	fn record(
		name: &str,
		role: Option<&str>,
		rank: Option<&str>,
		content_types: &[&str],
		legacy_extensions: &[&str],
	) -> DeclaredDocumentType {
		DeclaredDocumentType {
			type_name: Some(name.to_owned()),
			role: role.map(str::to_owned),
			handler_rank: rank.map(str::to_owned),
			content_types: content_types.iter().map(|s| (*s).to_owned()).collect(),
			legacy_extensions: legacy_extensions.iter().map(|s| (*s).to_owned()).collect(),
			is_package: None,
		}
	}

	fn registry() -> MemoryRegistry {
		MemoryRegistry::new()
			.with_type("public.plain-text", Some("txt"), &["txt", "text"])
			.with_type("net.daringfireball.markdown", Some("md"), &["md", "markdown"])
			.with_type("public.html", Some("html"), &["html", "htm"])
			.with_extension("txt", &["public.plain-text"])
			.with_extension("md", &["net.daringfireball.markdown"])
			.with_extension("html", &["public.html"])
	}

	#[test]
	fn empty_app_path_is_invalid() {
		let bridge = Bridge::new(registry());
		assert_eq!(
			bridge.supported_document_types("").unwrap_err().code(),
			ResultCode::InvalidApp
		);
	}

	#[test]
	fn unreadable_manifest_is_invalid_app() {
		let bridge = Bridge::new(registry());
		assert_eq!(
			bridge
				.supported_document_types("/Applications/Gone.app")
				.unwrap_err()
				.code(),
			ResultCode::InvalidApp
		);
	}

	#[test]
	fn declared_types_pass_through_with_aggregated_extensions() {
		let app = "/Applications/TextEdit.app";
		let bridge = Bridge::new(registry().with_manifest(
			app,
			vec![record(
				"Plain Text",
				Some("Editor"),
				Some("Owner"),
				&["public.plain-text"],
				&["asc"],
			)],
		));

		let types = bridge.supported_document_types(app).unwrap();
		assert_eq!(types.len(), 1);

		let doc = &types[0];
		assert_eq!(doc.type_name, "Plain Text");
		assert_eq!(doc.role, Role::Editor);
		assert_eq!(doc.handler_rank, Some(HandlerRank::Owner));
		assert_eq!(doc.utis, vec!["public.plain-text"]);
		// Preferred extension, tag list and legacy list unioned, sorted.
		assert_eq!(doc.extensions, vec!["asc", "text", "txt"]);
		assert!(!doc.is_package);
	}

	#[test]
	fn missing_identifiers_are_derived_from_legacy_extensions() {
		let app = "/Applications/Markdown.app";
		let bridge = Bridge::new(registry().with_manifest(
			app,
			vec![record("Markdown", Some("Editor"), None, &[], &["md", "unknown-ext"])],
		));

		let types = bridge.supported_document_types(app).unwrap();
		assert_eq!(types.len(), 1);
		assert_eq!(types[0].utis, vec!["net.daringfireball.markdown"]);
		assert_eq!(types[0].handler_rank, None);
	}

	#[test]
	fn records_with_no_usable_type_information_are_dropped() {
		let app = "/Applications/Odd.app";
		let bridge = Bridge::new(registry().with_manifest(
			app,
			vec![
				record("No Types At All", Some("Viewer"), None, &[], &[]),
				record("Unresolvable", Some("Viewer"), None, &[], &["zzz"]),
				record("Kept", Some("Viewer"), None, &["public.html"], &[]),
			],
		));

		let types = bridge.supported_document_types(app).unwrap();
		assert_eq!(types.len(), 1);
		assert_eq!(types[0].type_name, "Kept");
	}

	#[test]
	fn wildcard_records_are_dropped_entirely() {
		let app = "/Applications/Greedy.app";
		let bridge = Bridge::new(registry().with_manifest(
			app,
			vec![
				record("Anything", Some("Viewer"), None, &["public.item"], &[]),
				record("Any Data", Some("Viewer"), None, &["public.html", "public.data"], &[]),
				record("Any Content", Some("Viewer"), None, &["public.content"], &[]),
				record("Html", Some("Viewer"), None, &["public.html"], &[]),
			],
		));

		let types = bridge.supported_document_types(app).unwrap();
		assert_eq!(types.len(), 1);
		assert_eq!(types[0].utis, vec!["public.html"]);
		for doc in &types {
			for wildcard in WILDCARD_TYPES {
				assert!(!doc.utis.iter().any(|uti| uti == wildcard));
			}
		}
	}

	#[test]
	fn record_order_and_duplicates_are_preserved() {
		let app = "/Applications/Dup.app";
		let bridge = Bridge::new(registry().with_manifest(
			app,
			vec![
				record("Second Copy", Some("Viewer"), None, &["public.html"], &[]),
				record("First Copy", Some("Editor"), None, &["public.html"], &[]),
			],
		));

		let types = bridge.supported_document_types(app).unwrap();
		assert_eq!(types.len(), 2);
		assert_eq!(types[0].type_name, "Second Copy");
		assert_eq!(types[1].type_name, "First Copy");
		assert_eq!(types[0].utis, types[1].utis);
	}

	#[test]
	fn unknown_role_and_rank_strings_degrade_gracefully() {
		let app = "/Applications/Weird.app";
		let bridge = Bridge::new(registry().with_manifest(
			app,
			vec![record("Weird", Some("Superuser"), Some("Champion"), &["public.html"], &[])],
		));

		let types = bridge.supported_document_types(app).unwrap();
		assert_eq!(types[0].role, Role::None);
		assert_eq!(types[0].handler_rank, None);
	}

	#[test]
	fn zero_records_is_success() {
		let app = "/Applications/Plain.app";
		let bridge = Bridge::new(registry().with_manifest(app, vec![]));
		assert!(bridge.supported_document_types(app).unwrap().is_empty());
	}

	#[test]
	fn descriptors_serialize() {
		let doc = DocumentType {
			type_name: "Plain Text".into(),
			role: Role::Editor,
			handler_rank: None,
			utis: vec!["public.plain-text".into()],
			extensions: vec!["txt".into()],
			is_package: false,
		};
		let json = serde_json::to_string(&doc).unwrap();
		let back: DocumentType = serde_json::from_str(&json).unwrap();
		assert_eq!(back, doc);
	}
}
