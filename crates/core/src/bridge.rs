//! Handler Query Facade.
//!
//! Thin validation-first operations over the [`TypeRegistry`] collaborator.
//! Every operation validates its input before touching the registry, so a
//! malformed identifier can never reach the OS layer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};
use crate::registry::{AppInfo, HandlerTarget, TypeRegistry};
use crate::set_default;

/// Upper bound on how long a set-default mutation may block the caller.
pub const DEFAULT_SET_DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The consumer-facing bridge over the Type Registry Service.
///
/// All read operations are synchronous, reentrant and hold no shared mutable
/// state; a `Bridge` may be used concurrently from multiple threads.
pub struct Bridge<R> {
	registry: R,
	set_default_timeout: Duration,
}

impl<R: TypeRegistry> Bridge<R> {
	pub fn new(registry: R) -> Self {
		Self {
			registry,
			set_default_timeout: DEFAULT_SET_DEFAULT_TIMEOUT,
		}
	}

	/// Shrink or extend the blocking bound of set-default mutations.
	#[must_use]
	pub fn with_set_default_timeout(mut self, timeout: Duration) -> Self {
		self.set_default_timeout = timeout;
		self
	}

	pub fn registry(&self) -> &R {
		&self.registry
	}

	/// The default application for a document type.
	///
	/// Never returns `Ok` with an empty path: a registry answer without a
	/// usable path is reported as [`Error::NotFound`].
	pub fn default_app_for_uti(&self, uti: &str) -> Result<PathBuf> {
		let uti = valid_uti(uti)?;
		match self.registry.lookup_default_handler(HandlerTarget::Uti(uti))? {
			Some(path) if !path.as_os_str().is_empty() => {
				trace!(uti, path = %path.display(), "resolved default handler");
				Ok(path)
			}
			_ => Err(Error::NotFound(uti.to_owned())),
		}
	}

	/// The default application for a URL scheme.
	pub fn default_app_for_scheme(&self, scheme: &str) -> Result<PathBuf> {
		let scheme = valid_scheme(scheme)?;
		match self
			.registry
			.lookup_default_handler(HandlerTarget::Scheme(scheme))?
		{
			Some(path) if !path.as_os_str().is_empty() => {
				trace!(scheme, path = %path.display(), "resolved default handler");
				Ok(path)
			}
			_ => Err(Error::NotFound(scheme.to_owned())),
		}
	}

	/// Assign the default application for a document type, blocking until
	/// the OS resolves the mutation or the timeout elapses.
	pub fn set_default_app_for_uti(&self, app_path: &str, uti: &str) -> Result<()> {
		let uti = valid_uti(uti)?;
		let app_path = self.existing_app_path(app_path)?;
		debug!(uti, app_path = %app_path.display(), "setting default handler");
		set_default::await_set_default(
			&self.registry,
			app_path,
			HandlerTarget::Uti(uti),
			self.set_default_timeout,
		)
	}

	/// Assign the default application for a URL scheme, blocking until the
	/// OS resolves the mutation or the timeout elapses.
	pub fn set_default_app_for_scheme(&self, app_path: &str, scheme: &str) -> Result<()> {
		let scheme = valid_scheme(scheme)?;
		let app_path = self.existing_app_path(app_path)?;
		debug!(scheme, app_path = %app_path.display(), "setting default handler");
		set_default::await_set_default(
			&self.registry,
			app_path,
			HandlerTarget::Scheme(scheme),
			self.set_default_timeout,
		)
	}

	/// Every application capable of opening a document type. An empty list
	/// is success, not an error.
	pub fn apps_for_uti(&self, uti: &str) -> Result<Vec<PathBuf>> {
		let uti = valid_uti(uti)?;
		Ok(self
			.registry
			.lookup_capable_handlers(HandlerTarget::Uti(uti))?)
	}

	/// Every application capable of handling a URL scheme.
	pub fn apps_for_scheme(&self, scheme: &str) -> Result<Vec<PathBuf>> {
		let scheme = valid_scheme(scheme)?;
		Ok(self
			.registry
			.lookup_capable_handlers(HandlerTarget::Scheme(scheme))?)
	}

	/// Type identifiers for a filename extension, most specific first.
	///
	/// Zero matches is [`Error::NotFound`]: an unrecognized extension is a
	/// caller mistake, unlike a type with no capable applications.
	pub fn utis_for_extension(&self, extension: &str) -> Result<Vec<String>> {
		if extension.is_empty() {
			return Err(Error::InvalidType(extension.to_owned()));
		}
		let utis = self.registry.lookup_types_for_extension(extension)?;
		if utis.is_empty() {
			return Err(Error::NotFound(extension.to_owned()));
		}
		Ok(utis)
	}

	/// Filename extensions of a type, sorted ascending. May legitimately be
	/// empty, and an identifier unknown to the registry also yields empty.
	pub fn extensions_for_uti(&self, uti: &str) -> Result<Vec<String>> {
		let uti = valid_uti(uti)?;
		let mut extensions = self.registry.lookup_extensions_for_type(uti)?;
		extensions.sort_unstable();
		extensions.dedup();
		Ok(extensions)
	}

	/// Every installed application the registry knows about.
	pub fn all_applications(&self) -> Result<Vec<AppInfo>> {
		Ok(self.registry.installed_applications()?)
	}

	/// Validate a set-default application path: non-empty and present on the
	/// filesystem. The synchronous adapter is never reached otherwise.
	fn existing_app_path<'a>(&self, app_path: &'a str) -> Result<&'a Path> {
		if app_path.is_empty() {
			return Err(Error::InvalidApp(app_path.to_owned()));
		}
		let path = Path::new(app_path);
		if !path.try_exists().unwrap_or(false) {
			return Err(Error::InvalidApp(app_path.to_owned()));
		}
		Ok(path)
	}
}

fn valid_uti(uti: &str) -> Result<&str> {
	if uti.is_empty() {
		return Err(Error::InvalidType(uti.to_owned()));
	}
	Ok(uti)
}

/// A scheme is recognized iff a reference URL of that scheme is
/// constructible and parses back to the same scheme token.
fn valid_scheme(scheme: &str) -> Result<&str> {
	if scheme.is_empty() {
		return Err(Error::InvalidScheme(scheme.to_owned()));
	}
	match Url::parse(&format!("{scheme}:probe")) {
		Ok(url) if url.scheme() == scheme => Ok(scheme),
		_ => Err(Error::InvalidScheme(scheme.to_owned())),
	}
}
