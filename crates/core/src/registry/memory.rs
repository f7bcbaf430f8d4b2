//! Deterministic in-memory Type Registry Service.
//!
//! Seeded through a builder-style API and shared by every integration suite.
//! Mutations go through the same asynchronous completion path a real
//! registry would use: the completion handler is invoked from a separate
//! thread, or never, depending on [`SetDefaultBehavior`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::trace;

use super::{
	AppInfo, CompletionError, CompletionHandler, DeclaredDocumentType, HandlerTarget,
	RegistryError, RegistryResult, TypeRegistry,
};

/// How [`MemoryRegistry`] resolves a set-default mutation.
#[derive(Debug, Clone)]
pub enum SetDefaultBehavior {
	/// Apply the mutation and complete successfully.
	Complete,
	/// Complete with the user-cancelled error triple.
	Decline,
	/// Complete with an arbitrary error triple.
	Fail(CompletionError),
	/// Never invoke the completion handler.
	Never,
	/// Apply the mutation and complete after the given delay.
	CompleteAfter(Duration),
}

#[derive(Debug, Clone, Default)]
struct TypeRecord {
	preferred_extension: Option<String>,
	extensions: Vec<String>,
}

#[derive(Default)]
struct Inner {
	types: HashMap<String, TypeRecord>,
	extension_types: HashMap<String, Vec<String>>,
	defaults: HashMap<String, PathBuf>,
	capable: HashMap<String, Vec<PathBuf>>,
	applications: Vec<AppInfo>,
	manifests: HashMap<PathBuf, Vec<DeclaredDocumentType>>,
}

fn target_key(target: HandlerTarget<'_>) -> String {
	match target {
		HandlerTarget::Uti(uti) => format!("uti:{uti}"),
		HandlerTarget::Scheme(scheme) => format!("scheme:{scheme}"),
	}
}

/// In-memory [`TypeRegistry`] implementation.
pub struct MemoryRegistry {
	inner: Arc<Mutex<Inner>>,
	behavior: SetDefaultBehavior,
	set_default_calls: AtomicUsize,
}

impl Default for MemoryRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self {
			inner: Arc::new(Mutex::new(Inner::default())),
			behavior: SetDefaultBehavior::Complete,
			set_default_calls: AtomicUsize::new(0),
		}
	}

	/// Register a known type with its preferred extension and extension tags.
	#[must_use]
	pub fn with_type(
		self,
		uti: &str,
		preferred_extension: Option<&str>,
		extensions: &[&str],
	) -> Self {
		self.lock().types.insert(
			uti.to_owned(),
			TypeRecord {
				preferred_extension: preferred_extension.map(str::to_owned),
				extensions: extensions.iter().map(|ext| (*ext).to_owned()).collect(),
			},
		);
		self
	}

	/// Map an extension to type identifiers, most specific first.
	#[must_use]
	pub fn with_extension(self, extension: &str, utis: &[&str]) -> Self {
		self.lock().extension_types.insert(
			extension.to_owned(),
			utis.iter().map(|uti| (*uti).to_owned()).collect(),
		);
		self
	}

	#[must_use]
	pub fn with_default(self, target: HandlerTarget<'_>, app_path: impl Into<PathBuf>) -> Self {
		self.lock().defaults.insert(target_key(target), app_path.into());
		self
	}

	#[must_use]
	pub fn with_capable_handlers(
		self,
		target: HandlerTarget<'_>,
		app_paths: &[&str],
	) -> Self {
		self.lock().capable.insert(
			target_key(target),
			app_paths.iter().map(PathBuf::from).collect(),
		);
		self
	}

	#[must_use]
	pub fn with_application(self, app: AppInfo) -> Self {
		self.lock().applications.push(app);
		self
	}

	#[must_use]
	pub fn with_manifest(
		self,
		app_path: impl Into<PathBuf>,
		records: Vec<DeclaredDocumentType>,
	) -> Self {
		self.lock().manifests.insert(app_path.into(), records);
		self
	}

	#[must_use]
	pub fn with_set_default_behavior(mut self, behavior: SetDefaultBehavior) -> Self {
		self.behavior = behavior;
		self
	}

	/// How many times `begin_set_default_handler` has been invoked.
	#[must_use]
	pub fn set_default_calls(&self) -> usize {
		self.set_default_calls.load(Ordering::SeqCst)
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
		self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
	}
}

impl TypeRegistry for MemoryRegistry {
	fn lookup_default_handler(&self, target: HandlerTarget<'_>) -> RegistryResult<Option<PathBuf>> {
		let inner = self.lock();
		if let HandlerTarget::Uti(uti) = target {
			if !inner.types.contains_key(uti) {
				return Err(RegistryError::UnknownType(uti.to_owned()));
			}
		}
		Ok(inner.defaults.get(&target_key(target)).cloned())
	}

	fn lookup_capable_handlers(&self, target: HandlerTarget<'_>) -> RegistryResult<Vec<PathBuf>> {
		let inner = self.lock();
		if let HandlerTarget::Uti(uti) = target {
			if !inner.types.contains_key(uti) {
				return Err(RegistryError::UnknownType(uti.to_owned()));
			}
		}
		Ok(inner.capable.get(&target_key(target)).cloned().unwrap_or_default())
	}

	fn lookup_types_for_extension(&self, extension: &str) -> RegistryResult<Vec<String>> {
		Ok(self
			.lock()
			.extension_types
			.get(extension)
			.cloned()
			.unwrap_or_default())
	}

	fn lookup_extensions_for_type(&self, uti: &str) -> RegistryResult<Vec<String>> {
		Ok(self
			.lock()
			.types
			.get(uti)
			.map(|record| record.extensions.clone())
			.unwrap_or_default())
	}

	fn lookup_preferred_extension(&self, uti: &str) -> RegistryResult<Option<String>> {
		Ok(self
			.lock()
			.types
			.get(uti)
			.and_then(|record| record.preferred_extension.clone()))
	}

	fn installed_applications(&self) -> RegistryResult<Vec<AppInfo>> {
		Ok(self.lock().applications.clone())
	}

	fn declared_document_types(
		&self,
		app_path: &Path,
	) -> RegistryResult<Vec<DeclaredDocumentType>> {
		self.lock()
			.manifests
			.get(app_path)
			.cloned()
			.ok_or_else(|| RegistryError::ManifestUnreadable {
				path: app_path.to_path_buf(),
				reason: "no such application manifest".into(),
			})
	}

	fn begin_set_default_handler(
		&self,
		app_path: &Path,
		target: HandlerTarget<'_>,
		on_complete: CompletionHandler,
	) {
		self.set_default_calls.fetch_add(1, Ordering::SeqCst);

		let key = target_key(target);
		let app_path = app_path.to_path_buf();
		let inner = Arc::clone(&self.inner);

		trace!(%key, app_path = %app_path.display(), "set-default mutation started");

		match self.behavior.clone() {
			SetDefaultBehavior::Complete => {
				thread::spawn(move || {
					inner
						.lock()
						.unwrap_or_else(std::sync::PoisonError::into_inner)
						.defaults
						.insert(key, app_path);
					on_complete(Ok(()));
				});
			}
			SetDefaultBehavior::Decline => {
				thread::spawn(move || on_complete(Err(CompletionError::user_cancelled())));
			}
			SetDefaultBehavior::Fail(err) => {
				thread::spawn(move || on_complete(Err(err)));
			}
			SetDefaultBehavior::Never => drop(on_complete),
			SetDefaultBehavior::CompleteAfter(delay) => {
				thread::spawn(move || {
					thread::sleep(delay);
					inner
						.lock()
						.unwrap_or_else(std::sync::PoisonError::into_inner)
						.defaults
						.insert(key, app_path);
					on_complete(Ok(()));
				});
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_uti_is_an_error_but_unknown_scheme_is_not() {
		let registry = MemoryRegistry::new().with_type("public.html", Some("html"), &["html"]);

		assert!(matches!(
			registry.lookup_default_handler(HandlerTarget::Uti("com.example.nope")),
			Err(RegistryError::UnknownType(_))
		));
		assert_eq!(
			registry
				.lookup_default_handler(HandlerTarget::Scheme("gopher"))
				.unwrap(),
			None
		);
	}

	#[test]
	fn seeded_lookups() {
		let registry = MemoryRegistry::new()
			.with_type("public.html", Some("html"), &["html", "htm"])
			.with_extension("html", &["public.html"])
			.with_default(HandlerTarget::Uti("public.html"), "/Applications/Safari.app");

		assert_eq!(
			registry
				.lookup_default_handler(HandlerTarget::Uti("public.html"))
				.unwrap(),
			Some(PathBuf::from("/Applications/Safari.app"))
		);
		assert_eq!(
			registry.lookup_extensions_for_type("public.html").unwrap(),
			vec!["html", "htm"]
		);
		assert_eq!(
			registry.lookup_preferred_extension("public.html").unwrap(),
			Some("html".to_owned())
		);
		assert_eq!(
			registry.lookup_types_for_extension("html").unwrap(),
			vec!["public.html"]
		);
		assert!(registry.lookup_types_for_extension("zzz").unwrap().is_empty());
	}

	#[test]
	fn manifest_for_unknown_app_is_unreadable() {
		let registry = MemoryRegistry::new();
		assert!(matches!(
			registry.declared_document_types(Path::new("/Applications/Gone.app")),
			Err(RegistryError::ManifestUnreadable { .. })
		));
	}
}
