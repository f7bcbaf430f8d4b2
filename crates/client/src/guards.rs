//! Ownership guards for boundary memory.
//!
//! Release across the boundary is not idempotent, so every received pointer
//! is wrapped in a type whose `Drop` releases it exactly once. Guards take
//! ownership the moment an operation returns, including diagnostic strings
//! on error paths.

use std::ffi::{c_char, CStr};
use std::path::PathBuf;
use std::ptr::NonNull;
use std::slice;

use apphandlers_core::{AppInfo, DocumentType};
use apphandlers_ffi::{
	apphandlers_app_info_array_free, apphandlers_document_type_array_free,
	apphandlers_string_array_free, apphandlers_string_free, CAppInfo, CDocumentType,
};

/// A single caller-owned boundary string.
pub(crate) struct OwnedString(NonNull<c_char>);

impl OwnedString {
	/// Take ownership of a boundary string; null is the absent marker.
	///
	/// SAFETY: `ptr` must be null or an unreleased string produced by the
	/// boundary, and must not be released elsewhere afterwards.
	pub(crate) unsafe fn from_raw(ptr: *mut c_char) -> Option<Self> {
		NonNull::new(ptr).map(Self)
	}

	pub(crate) fn read(&self) -> String {
		unsafe { CStr::from_ptr(self.0.as_ptr()) }
			.to_string_lossy()
			.into_owned()
	}
}

impl Drop for OwnedString {
	fn drop(&mut self) {
		unsafe { apphandlers_string_free(self.0.as_ptr()) };
	}
}

unsafe fn read_string_array(items: *const *mut c_char, count: u32) -> Vec<String> {
	if items.is_null() {
		return Vec::new();
	}
	slice::from_raw_parts(items, count as usize)
		.iter()
		.map(|item| CStr::from_ptr(*item).to_string_lossy().into_owned())
		.collect()
}

/// A caller-owned `{count, items}` string array.
pub(crate) struct OwnedStringArray {
	items: *mut *mut c_char,
	count: u32,
}

impl OwnedStringArray {
	/// SAFETY: `(items, count)` must be an unreleased pair produced by one
	/// boundary operation.
	pub(crate) unsafe fn from_raw(items: *mut *mut c_char, count: u32) -> Self {
		Self { items, count }
	}

	pub(crate) fn read(&self) -> Vec<String> {
		unsafe { read_string_array(self.items, self.count) }
	}
}

impl Drop for OwnedStringArray {
	fn drop(&mut self) {
		unsafe { apphandlers_string_array_free(self.items, self.count) };
	}
}

pub(crate) struct OwnedAppInfoArray {
	items: *mut CAppInfo,
	count: u32,
}

impl OwnedAppInfoArray {
	/// SAFETY: as [`OwnedStringArray::from_raw`].
	pub(crate) unsafe fn from_raw(items: *mut CAppInfo, count: u32) -> Self {
		Self { items, count }
	}

	pub(crate) fn read(&self) -> Vec<AppInfo> {
		if self.items.is_null() {
			return Vec::new();
		}
		unsafe { slice::from_raw_parts(self.items, self.count as usize) }
			.iter()
			.map(|app| AppInfo {
				name: unsafe { CStr::from_ptr(app.name) }.to_string_lossy().into_owned(),
				path: PathBuf::from(
					unsafe { CStr::from_ptr(app.path) }.to_string_lossy().into_owned(),
				),
				bundle_id: unsafe { CStr::from_ptr(app.bundle_id) }
					.to_string_lossy()
					.into_owned(),
			})
			.collect()
	}
}

impl Drop for OwnedAppInfoArray {
	fn drop(&mut self) {
		unsafe { apphandlers_app_info_array_free(self.items, self.count) };
	}
}

pub(crate) struct OwnedDocumentTypeArray {
	items: *mut CDocumentType,
	count: u32,
}

impl OwnedDocumentTypeArray {
	/// SAFETY: as [`OwnedStringArray::from_raw`].
	pub(crate) unsafe fn from_raw(items: *mut CDocumentType, count: u32) -> Self {
		Self { items, count }
	}

	pub(crate) fn read(&self) -> Vec<DocumentType> {
		if self.items.is_null() {
			return Vec::new();
		}
		unsafe { slice::from_raw_parts(self.items, self.count as usize) }
			.iter()
			.map(|doc| DocumentType {
				type_name: unsafe { CStr::from_ptr(doc.type_name) }
					.to_string_lossy()
					.into_owned(),
				role: unsafe { CStr::from_ptr(doc.role) }
					.to_str()
					.ok()
					.and_then(|role| role.parse().ok())
					.unwrap_or_default(),
				// Null means the manifest declared no rank at all.
				handler_rank: if doc.handler_rank.is_null() {
					None
				} else {
					unsafe { CStr::from_ptr(doc.handler_rank) }
						.to_str()
						.ok()
						.and_then(|rank| rank.parse().ok())
				},
				utis: unsafe { read_string_array(doc.utis, doc.uti_count) },
				extensions: unsafe { read_string_array(doc.extensions, doc.extension_count) },
				is_package: doc.is_package,
			})
			.collect()
	}
}

impl Drop for OwnedDocumentTypeArray {
	fn drop(&mut self) {
		unsafe { apphandlers_document_type_array_free(self.items, self.count) };
	}
}
