//! # apphandlers-client
//!
//! Safe caller-side wrapper over the bridge's C boundary.
//!
//! [`BridgeClient`] owns an opaque bridge handle and exposes the boundary
//! operations as ordinary Rust methods: result codes become [`ClientError`],
//! boundary-encoded payloads are copied into owned values and the boundary
//! memory is released exactly once, including diagnostics on error paths.
//!
//! ```
//! use apphandlers_client::BridgeClient;
//! use apphandlers_core::{HandlerTarget, MemoryRegistry};
//!
//! let registry = MemoryRegistry::new()
//! 	.with_type("public.plain-text", Some("txt"), &["txt"])
//! 	.with_default(HandlerTarget::Uti("public.plain-text"), "/Applications/Editor.app");
//!
//! let client = BridgeClient::new(registry);
//! let path = client.default_app_for_uti("public.plain-text").unwrap();
//! assert_eq!(path, "/Applications/Editor.app");
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

use std::ffi::{c_char, CString};
use std::ptr;

use apphandlers_core::{AppInfo, Bridge, DocumentType, ResultCode, TypeRegistry};
use apphandlers_ffi::{
	apphandlers_all_applications, apphandlers_apps_for_scheme, apphandlers_apps_for_uti,
	apphandlers_bridge_free, apphandlers_default_app_for_scheme, apphandlers_default_app_for_uti,
	apphandlers_default_document_types, apphandlers_extensions_for_uti,
	apphandlers_set_default_app_for_scheme, apphandlers_set_default_app_for_uti,
	apphandlers_supported_document_types, apphandlers_utis_for_extension, BridgeHandle,
	CAppInfo, CDocumentType, DynRegistry,
};
use tracing::trace;

mod guards;

use guards::{OwnedAppInfoArray, OwnedDocumentTypeArray, OwnedString, OwnedStringArray};

/// A non-OK result code surfaced by the boundary, with its diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("bridge error (code {code}): {message}")]
pub struct ClientError {
	pub code: ResultCode,
	pub message: String,
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Owning wrapper around a raw bridge handle.
pub struct BridgeClient {
	handle: *mut BridgeHandle,
}

// The handle is only ever borrowed immutably by the boundary operations and
// the underlying registry is Send + Sync.
unsafe impl Send for BridgeClient {}
unsafe impl Sync for BridgeClient {}

impl BridgeClient {
	#[must_use]
	pub fn new(registry: impl TypeRegistry + 'static) -> Self {
		Self {
			handle: BridgeHandle::new(registry).into_raw(),
		}
	}

	#[must_use]
	pub fn with_bridge(bridge: Bridge<DynRegistry>) -> Self {
		Self {
			handle: BridgeHandle::with_bridge(bridge).into_raw(),
		}
	}

	fn check(&self, code: i32, out_error: *mut c_char) -> Result<()> {
		// Take ownership of the diagnostic before anything can early-return.
		let diagnostic = unsafe { OwnedString::from_raw(out_error) };
		match ResultCode::from_raw(code) {
			Some(ResultCode::Ok) => Ok(()),
			Some(result) => {
				let message = diagnostic.map(|d| d.read()).unwrap_or_default();
				trace!(code = %result, message = %message, "bridge operation failed");
				Err(ClientError { code: result, message })
			}
			None => Err(ClientError {
				code: ResultCode::System,
				message: format!("unrecognized result code {code}"),
			}),
		}
	}

	/// The path of the default application for a document type.
	pub fn default_app_for_uti(&self, uti: &str) -> Result<String> {
		let uti = c_input(uti)?;
		let mut out_path: *mut c_char = ptr::null_mut();
		let mut out_error: *mut c_char = ptr::null_mut();
		let code = unsafe {
			apphandlers_default_app_for_uti(self.handle, uti.as_ptr(), &mut out_path, &mut out_error)
		};
		let path = unsafe { OwnedString::from_raw(out_path) };
		self.check(code, out_error)?;
		Ok(path.map(|p| p.read()).unwrap_or_default())
	}

	/// The path of the default application for a URL scheme.
	pub fn default_app_for_scheme(&self, scheme: &str) -> Result<String> {
		let scheme = c_input(scheme)?;
		let mut out_path: *mut c_char = ptr::null_mut();
		let mut out_error: *mut c_char = ptr::null_mut();
		let code = unsafe {
			apphandlers_default_app_for_scheme(
				self.handle,
				scheme.as_ptr(),
				&mut out_path,
				&mut out_error,
			)
		};
		let path = unsafe { OwnedString::from_raw(out_path) };
		self.check(code, out_error)?;
		Ok(path.map(|p| p.read()).unwrap_or_default())
	}

	/// Assign the default application for a document type. Blocks until the
	/// registry resolves the mutation or the bridge timeout elapses.
	pub fn set_default_app_for_uti(&self, app_path: &str, uti: &str) -> Result<()> {
		let app_path = c_input(app_path)?;
		let uti = c_input(uti)?;
		let mut out_error: *mut c_char = ptr::null_mut();
		let code = unsafe {
			apphandlers_set_default_app_for_uti(
				self.handle,
				app_path.as_ptr(),
				uti.as_ptr(),
				&mut out_error,
			)
		};
		self.check(code, out_error)
	}

	/// Assign the default application for a URL scheme.
	pub fn set_default_app_for_scheme(&self, app_path: &str, scheme: &str) -> Result<()> {
		let app_path = c_input(app_path)?;
		let scheme = c_input(scheme)?;
		let mut out_error: *mut c_char = ptr::null_mut();
		let code = unsafe {
			apphandlers_set_default_app_for_scheme(
				self.handle,
				app_path.as_ptr(),
				scheme.as_ptr(),
				&mut out_error,
			)
		};
		self.check(code, out_error)
	}

	/// Type identifiers matching a filename extension, most specific first.
	pub fn utis_for_extension(&self, extension: &str) -> Result<Vec<String>> {
		let extension = c_input(extension)?;
		let mut out_items: *mut *mut c_char = ptr::null_mut();
		let mut out_count: u32 = 0;
		let mut out_error: *mut c_char = ptr::null_mut();
		let code = unsafe {
			apphandlers_utis_for_extension(
				self.handle,
				extension.as_ptr(),
				&mut out_items,
				&mut out_count,
				&mut out_error,
			)
		};
		let utis = unsafe { OwnedStringArray::from_raw(out_items, out_count) };
		self.check(code, out_error)?;
		Ok(utis.read())
	}

	/// Filename extensions of a type, sorted ascending. Empty means the type
	/// has no extensions or is unknown.
	pub fn extensions_for_uti(&self, uti: &str) -> Result<Vec<String>> {
		let uti = c_input(uti)?;
		let mut out_items: *mut *mut c_char = ptr::null_mut();
		let mut out_count: u32 = 0;
		let mut out_error: *mut c_char = ptr::null_mut();
		let code = unsafe {
			apphandlers_extensions_for_uti(
				self.handle,
				uti.as_ptr(),
				&mut out_items,
				&mut out_count,
				&mut out_error,
			)
		};
		let extensions = unsafe { OwnedStringArray::from_raw(out_items, out_count) };
		self.check(code, out_error)?;
		Ok(extensions.read())
	}

	/// Paths of every application capable of opening a document type.
	pub fn apps_for_uti(&self, uti: &str) -> Result<Vec<String>> {
		let uti = c_input(uti)?;
		let mut out_items: *mut *mut c_char = ptr::null_mut();
		let mut out_count: u32 = 0;
		let mut out_error: *mut c_char = ptr::null_mut();
		let code = unsafe {
			apphandlers_apps_for_uti(
				self.handle,
				uti.as_ptr(),
				&mut out_items,
				&mut out_count,
				&mut out_error,
			)
		};
		let apps = unsafe { OwnedStringArray::from_raw(out_items, out_count) };
		self.check(code, out_error)?;
		Ok(apps.read())
	}

	/// Paths of every application capable of handling a URL scheme.
	pub fn apps_for_scheme(&self, scheme: &str) -> Result<Vec<String>> {
		let scheme = c_input(scheme)?;
		let mut out_items: *mut *mut c_char = ptr::null_mut();
		let mut out_count: u32 = 0;
		let mut out_error: *mut c_char = ptr::null_mut();
		let code = unsafe {
			apphandlers_apps_for_scheme(
				self.handle,
				scheme.as_ptr(),
				&mut out_items,
				&mut out_count,
				&mut out_error,
			)
		};
		let apps = unsafe { OwnedStringArray::from_raw(out_items, out_count) };
		self.check(code, out_error)?;
		Ok(apps.read())
	}

	/// Every installed application known to the registry.
	pub fn all_applications(&self) -> Result<Vec<AppInfo>> {
		let mut out_apps: *mut CAppInfo = ptr::null_mut();
		let mut out_count: u32 = 0;
		let mut out_error: *mut c_char = ptr::null_mut();
		let code = unsafe {
			apphandlers_all_applications(self.handle, &mut out_apps, &mut out_count, &mut out_error)
		};
		let apps = unsafe { OwnedAppInfoArray::from_raw(out_apps, out_count) };
		self.check(code, out_error)?;
		Ok(apps.read())
	}

	/// Every document type an application declares it can handle, in
	/// manifest order.
	pub fn supported_document_types(&self, app_path: &str) -> Result<Vec<DocumentType>> {
		let app_path = c_input(app_path)?;
		let mut out_docs: *mut CDocumentType = ptr::null_mut();
		let mut out_count: u32 = 0;
		let mut out_error: *mut c_char = ptr::null_mut();
		let code = unsafe {
			apphandlers_supported_document_types(
				self.handle,
				app_path.as_ptr(),
				&mut out_docs,
				&mut out_count,
				&mut out_error,
			)
		};
		let docs = unsafe { OwnedDocumentTypeArray::from_raw(out_docs, out_count) };
		self.check(code, out_error)?;
		Ok(docs.read())
	}

	/// The subset of declared document types the application currently owns
	/// as the system default, narrowed to the matching identifiers.
	pub fn default_document_types(&self, app_path: &str) -> Result<Vec<DocumentType>> {
		let app_path = c_input(app_path)?;
		let mut out_docs: *mut CDocumentType = ptr::null_mut();
		let mut out_count: u32 = 0;
		let mut out_error: *mut c_char = ptr::null_mut();
		let code = unsafe {
			apphandlers_default_document_types(
				self.handle,
				app_path.as_ptr(),
				&mut out_docs,
				&mut out_count,
				&mut out_error,
			)
		};
		let docs = unsafe { OwnedDocumentTypeArray::from_raw(out_docs, out_count) };
		self.check(code, out_error)?;
		Ok(docs.read())
	}
}

impl Drop for BridgeClient {
	fn drop(&mut self) {
		unsafe { apphandlers_bridge_free(self.handle) };
	}
}

fn c_input(value: &str) -> Result<CString> {
	CString::new(value).map_err(|_| ClientError {
		code: ResultCode::System,
		message: "input contains an interior NUL byte".to_owned(),
	})
}
