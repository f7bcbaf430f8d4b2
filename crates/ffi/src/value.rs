//! Boundary Value Encoding.
//!
//! Strings cross the boundary as owned NUL-terminated allocations (null is
//! the nil marker); sequences cross as a count plus one contiguous
//! allocation. Internal code only ever handles owned Rust values; these
//! functions are the single conversion point per direction.
//!
//! Every conversion is staged: all fallible work happens while the values
//! are still owned by Rust, so a mid-conversion failure rolls back by
//! simply dropping them, and raw memory is only produced once nothing can
//! fail anymore. Ownership of every produced pointer transfers to the
//! caller the moment the operation returns.

use std::ffi::{c_char, CString};
use std::ptr;

use apphandlers_core::{AppInfo, DocumentType, Error, Result};

/// Application record crossing the boundary. All fields are owned,
/// NUL-terminated and non-null.
#[repr(C)]
pub struct CAppInfo {
	pub name: *mut c_char,
	pub path: *mut c_char,
	pub bundle_id: *mut c_char,
}

/// Document-type descriptor crossing the boundary.
///
/// `handler_rank` is null when the manifest declared no rank; this is a
/// distinct state from any rank string. A count of zero always pairs with
/// a null items pointer.
#[repr(C)]
pub struct CDocumentType {
	pub type_name: *mut c_char,
	pub role: *mut c_char,
	pub handler_rank: *mut c_char,
	pub utis: *mut *mut c_char,
	pub uti_count: u32,
	pub extensions: *mut *mut c_char,
	pub extension_count: u32,
	pub is_package: bool,
}

pub(crate) fn c_string(s: &str) -> Result<CString> {
	CString::new(s).map_err(|_| Error::System("string contains an interior NUL byte".into()))
}

pub(crate) fn c_path(path: &std::path::Path) -> Result<CString> {
	let s = path
		.to_str()
		.ok_or_else(|| Error::System(format!("non UTF-8 path: {path:?}")))?;
	c_string(s)
}

pub(crate) fn c_len(len: usize) -> Result<u32> {
	u32::try_from(len).map_err(|_| Error::System("result set too large for the boundary".into()))
}

/// Single string → caller-owned allocation.
pub(crate) fn export_string(s: &str) -> Result<*mut c_char> {
	Ok(c_string(s)?.into_raw())
}

/// Owned strings → `{count, contiguous array of string handles}`. An empty
/// sequence encodes as `{0, null}`, which is success, not an error marker.
pub(crate) fn export_string_array(items: &[String]) -> Result<(*mut *mut c_char, u32)> {
	let count = c_len(items.len())?;
	let owned = items
		.iter()
		.map(|item| c_string(item))
		.collect::<Result<Vec<_>>>()?;
	Ok((raw_pointer_array(owned), count))
}

pub(crate) fn export_path_array(items: &[std::path::PathBuf]) -> Result<(*mut *mut c_char, u32)> {
	let count = c_len(items.len())?;
	let owned = items
		.iter()
		.map(|item| c_path(item))
		.collect::<Result<Vec<_>>>()?;
	Ok((raw_pointer_array(owned), count))
}

fn raw_pointer_array(items: Vec<CString>) -> *mut *mut c_char {
	if items.is_empty() {
		return ptr::null_mut();
	}
	let raw: Vec<*mut c_char> = items.into_iter().map(CString::into_raw).collect();
	Box::into_raw(raw.into_boxed_slice()).cast::<*mut c_char>()
}

pub(crate) fn export_app_infos(apps: &[AppInfo]) -> Result<(*mut CAppInfo, u32)> {
	let count = c_len(apps.len())?;
	let owned = apps
		.iter()
		.map(|app| Ok((c_string(&app.name)?, c_path(&app.path)?, c_string(&app.bundle_id)?)))
		.collect::<Result<Vec<_>>>()?;

	if owned.is_empty() {
		return Ok((ptr::null_mut(), 0));
	}

	let raw: Vec<CAppInfo> = owned
		.into_iter()
		.map(|(name, path, bundle_id)| CAppInfo {
			name: name.into_raw(),
			path: path.into_raw(),
			bundle_id: bundle_id.into_raw(),
		})
		.collect();
	Ok((Box::into_raw(raw.into_boxed_slice()).cast::<CAppInfo>(), count))
}

struct OwnedDocType {
	type_name: CString,
	role: CString,
	handler_rank: Option<CString>,
	utis: Vec<CString>,
	uti_count: u32,
	extensions: Vec<CString>,
	extension_count: u32,
	is_package: bool,
}

impl OwnedDocType {
	fn stage(doc: &DocumentType) -> Result<Self> {
		Ok(Self {
			type_name: c_string(&doc.type_name)?,
			role: c_string(&doc.role.to_string())?,
			handler_rank: doc
				.handler_rank
				.map(|rank| c_string(&rank.to_string()))
				.transpose()?,
			uti_count: c_len(doc.utis.len())?,
			utis: doc.utis.iter().map(|uti| c_string(uti)).collect::<Result<_>>()?,
			extension_count: c_len(doc.extensions.len())?,
			extensions: doc
				.extensions
				.iter()
				.map(|ext| c_string(ext))
				.collect::<Result<_>>()?,
			is_package: doc.is_package,
		})
	}

	fn into_raw(self) -> CDocumentType {
		CDocumentType {
			type_name: self.type_name.into_raw(),
			role: self.role.into_raw(),
			handler_rank: self.handler_rank.map_or(ptr::null_mut(), CString::into_raw),
			utis: raw_pointer_array(self.utis),
			uti_count: self.uti_count,
			extensions: raw_pointer_array(self.extensions),
			extension_count: self.extension_count,
			is_package: self.is_package,
		}
	}
}

pub(crate) fn export_document_types(docs: &[DocumentType]) -> Result<(*mut CDocumentType, u32)> {
	let count = c_len(docs.len())?;
	let owned = docs.iter().map(OwnedDocType::stage).collect::<Result<Vec<_>>>()?;

	if owned.is_empty() {
		return Ok((ptr::null_mut(), 0));
	}

	let raw: Vec<CDocumentType> = owned.into_iter().map(OwnedDocType::into_raw).collect();
	Ok((
		Box::into_raw(raw.into_boxed_slice()).cast::<CDocumentType>(),
		count,
	))
}

/// SAFETY: `ptr` must be null or a string produced by this module, released
/// at most once.
pub(crate) unsafe fn release_string(ptr: *mut c_char) {
	if !ptr.is_null() {
		drop(CString::from_raw(ptr));
	}
}

/// SAFETY: `(ptr, count)` must be a pair produced by this module, released
/// at most once. Releasing `(null, 0)` is a no-op.
pub(crate) unsafe fn release_string_array(ptr: *mut *mut c_char, count: u32) {
	if ptr.is_null() {
		return;
	}
	let items = Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, count as usize));
	for item in items.iter() {
		release_string(*item);
	}
}

/// SAFETY: as [`release_string_array`]; deep-releases every nested field.
pub(crate) unsafe fn release_app_info_array(ptr: *mut CAppInfo, count: u32) {
	if ptr.is_null() {
		return;
	}
	let apps = Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, count as usize));
	for app in apps.iter() {
		release_string(app.name);
		release_string(app.path);
		release_string(app.bundle_id);
	}
}

/// SAFETY: as [`release_string_array`]; deep-releases every nested field.
pub(crate) unsafe fn release_document_type_array(ptr: *mut CDocumentType, count: u32) {
	if ptr.is_null() {
		return;
	}
	let docs = Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, count as usize));
	for doc in docs.iter() {
		release_string(doc.type_name);
		release_string(doc.role);
		release_string(doc.handler_rank);
		release_string_array(doc.utis, doc.uti_count);
		release_string_array(doc.extensions, doc.extension_count);
	}
}
