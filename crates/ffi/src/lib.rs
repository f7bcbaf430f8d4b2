//! # apphandlers-ffi
//!
//! The C boundary of the default-handler registry bridge.
//!
//! The embedding host builds a [`BridgeHandle`] around a concrete
//! [`apphandlers_core::TypeRegistry`] and hands the raw pointer to the
//! foreign side. Every operation returns an `i32` result code from the
//! fixed set in [`apphandlers_core::ResultCode`], writes a diagnostic
//! string into `out_error` only on non-OK, and transfers ownership of every
//! produced pointer to the caller, who must release it exactly once through
//! the matching `_free` function.
//!
//! Array out-slots are written atomically with respect to each other: both
//! are zeroed on entry and only written together on success, so a reader
//! never observes a non-zero count with a null items pointer or vice versa.
//!
//! No operation unwinds across the boundary; a panic is reported as a
//! system failure code.

use std::ffi::{c_char, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

use apphandlers_core::{Error, Result, ResultCode};
use tracing::debug;

mod handle;
mod value;

pub use handle::{BridgeHandle, DynRegistry};
pub use value::{CAppInfo, CDocumentType};

fn fail(out_error: *mut *mut c_char, err: &Error) -> i32 {
	debug!(code = %err.code(), %err, "bridge operation failed");
	if !out_error.is_null() {
		let message = value::export_string(&err.to_string()).unwrap_or(ptr::null_mut());
		unsafe { out_error.write(message) };
	}
	err.code() as i32
}

fn run(out_error: *mut *mut c_char, op: impl FnOnce() -> Result<()>) -> i32 {
	if !out_error.is_null() {
		unsafe { out_error.write(ptr::null_mut()) };
	}
	match catch_unwind(AssertUnwindSafe(op)) {
		Ok(Ok(())) => ResultCode::Ok as i32,
		Ok(Err(err)) => fail(out_error, &err),
		Err(_) => fail(
			out_error,
			&Error::System("panic crossing the bridge boundary".into()),
		),
	}
}

unsafe fn borrow<'a>(bridge: *const BridgeHandle) -> Result<&'a BridgeHandle> {
	bridge
		.as_ref()
		.ok_or_else(|| Error::System("null bridge handle".into()))
}

/// Decode a caller string. Null and invalid UTF-8 both decode to the empty
/// string, which every operation rejects with its input-validation code.
unsafe fn decode<'a>(ptr: *const c_char) -> &'a str {
	if ptr.is_null() {
		return "";
	}
	CStr::from_ptr(ptr).to_str().unwrap_or("")
}

unsafe fn string_slot(slot: *mut *mut c_char) -> Result<*mut *mut c_char> {
	if slot.is_null() {
		return Err(Error::System("null output parameter".into()));
	}
	slot.write(ptr::null_mut());
	Ok(slot)
}

unsafe fn array_slots<T>(items: *mut *mut T, count: *mut u32) -> Result<(*mut *mut T, *mut u32)> {
	if items.is_null() || count.is_null() {
		return Err(Error::System("null output parameter".into()));
	}
	items.write(ptr::null_mut());
	count.write(0);
	Ok((items, count))
}

/// Release a bridge handle.
///
/// SAFETY: `bridge` must come from [`BridgeHandle::into_raw`] and must never
/// be used again after this call. Passing null is a no-op.
#[no_mangle]
pub unsafe extern "C" fn apphandlers_bridge_free(bridge: *mut BridgeHandle) {
	if !bridge.is_null() {
		drop(BridgeHandle::from_raw(bridge));
	}
}

/// The default application for a document type.
///
/// On OK, `*out_app_path` receives a caller-owned string.
///
/// SAFETY: `bridge` must be a live handle; out parameters must be valid for
/// writes; `uti` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn apphandlers_default_app_for_uti(
	bridge: *const BridgeHandle,
	uti: *const c_char,
	out_app_path: *mut *mut c_char,
	out_error: *mut *mut c_char,
) -> i32 {
	run(out_error, || {
		let handle = borrow(bridge)?;
		let slot = string_slot(out_app_path)?;
		let path = handle.bridge().default_app_for_uti(decode(uti))?;
		slot.write(value::c_path(&path)?.into_raw());
		Ok(())
	})
}

/// The default application for a URL scheme.
///
/// SAFETY: as [`apphandlers_default_app_for_uti`].
#[no_mangle]
pub unsafe extern "C" fn apphandlers_default_app_for_scheme(
	bridge: *const BridgeHandle,
	scheme: *const c_char,
	out_app_path: *mut *mut c_char,
	out_error: *mut *mut c_char,
) -> i32 {
	run(out_error, || {
		let handle = borrow(bridge)?;
		let slot = string_slot(out_app_path)?;
		let path = handle.bridge().default_app_for_scheme(decode(scheme))?;
		slot.write(value::c_path(&path)?.into_raw());
		Ok(())
	})
}

/// Assign the default application for a document type. Blocks until the OS
/// resolves the mutation or the bridge timeout elapses.
///
/// SAFETY: `bridge` must be a live handle; `app_path`/`uti` must be null or
/// NUL-terminated strings; `out_error` must be valid for writes or null.
#[no_mangle]
pub unsafe extern "C" fn apphandlers_set_default_app_for_uti(
	bridge: *const BridgeHandle,
	app_path: *const c_char,
	uti: *const c_char,
	out_error: *mut *mut c_char,
) -> i32 {
	run(out_error, || {
		borrow(bridge)?
			.bridge()
			.set_default_app_for_uti(decode(app_path), decode(uti))
	})
}

/// Assign the default application for a URL scheme.
///
/// SAFETY: as [`apphandlers_set_default_app_for_uti`].
#[no_mangle]
pub unsafe extern "C" fn apphandlers_set_default_app_for_scheme(
	bridge: *const BridgeHandle,
	app_path: *const c_char,
	scheme: *const c_char,
	out_error: *mut *mut c_char,
) -> i32 {
	run(out_error, || {
		borrow(bridge)?
			.bridge()
			.set_default_app_for_scheme(decode(app_path), decode(scheme))
	})
}

/// Type identifiers for a filename extension, most specific first.
///
/// SAFETY: `bridge` must be a live handle; out parameters must be valid for
/// writes; `extension` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn apphandlers_utis_for_extension(
	bridge: *const BridgeHandle,
	extension: *const c_char,
	out_utis: *mut *mut *mut c_char,
	out_count: *mut u32,
	out_error: *mut *mut c_char,
) -> i32 {
	run(out_error, || {
		let handle = borrow(bridge)?;
		let (items_slot, count_slot) = array_slots(out_utis, out_count)?;
		let utis = handle.bridge().utis_for_extension(decode(extension))?;
		let (items, count) = value::export_string_array(&utis)?;
		items_slot.write(items);
		count_slot.write(count);
		Ok(())
	})
}

/// Filename extensions of a type, sorted ascending. `{0, null}` output with
/// an OK code means the type has no extensions (or is unknown); callers
/// distinguish emptiness from failure via the code alone.
///
/// SAFETY: as [`apphandlers_utis_for_extension`].
#[no_mangle]
pub unsafe extern "C" fn apphandlers_extensions_for_uti(
	bridge: *const BridgeHandle,
	uti: *const c_char,
	out_extensions: *mut *mut *mut c_char,
	out_count: *mut u32,
	out_error: *mut *mut c_char,
) -> i32 {
	run(out_error, || {
		let handle = borrow(bridge)?;
		let (items_slot, count_slot) = array_slots(out_extensions, out_count)?;
		let extensions = handle.bridge().extensions_for_uti(decode(uti))?;
		let (items, count) = value::export_string_array(&extensions)?;
		items_slot.write(items);
		count_slot.write(count);
		Ok(())
	})
}

/// Every application capable of opening a document type.
///
/// SAFETY: as [`apphandlers_utis_for_extension`].
#[no_mangle]
pub unsafe extern "C" fn apphandlers_apps_for_uti(
	bridge: *const BridgeHandle,
	uti: *const c_char,
	out_app_paths: *mut *mut *mut c_char,
	out_count: *mut u32,
	out_error: *mut *mut c_char,
) -> i32 {
	run(out_error, || {
		let handle = borrow(bridge)?;
		let (items_slot, count_slot) = array_slots(out_app_paths, out_count)?;
		let apps = handle.bridge().apps_for_uti(decode(uti))?;
		let (items, count) = value::export_path_array(&apps)?;
		items_slot.write(items);
		count_slot.write(count);
		Ok(())
	})
}

/// Every application capable of handling a URL scheme.
///
/// SAFETY: as [`apphandlers_utis_for_extension`].
#[no_mangle]
pub unsafe extern "C" fn apphandlers_apps_for_scheme(
	bridge: *const BridgeHandle,
	scheme: *const c_char,
	out_app_paths: *mut *mut *mut c_char,
	out_count: *mut u32,
	out_error: *mut *mut c_char,
) -> i32 {
	run(out_error, || {
		let handle = borrow(bridge)?;
		let (items_slot, count_slot) = array_slots(out_app_paths, out_count)?;
		let apps = handle.bridge().apps_for_scheme(decode(scheme))?;
		let (items, count) = value::export_path_array(&apps)?;
		items_slot.write(items);
		count_slot.write(count);
		Ok(())
	})
}

/// Every installed application known to the registry.
///
/// SAFETY: `bridge` must be a live handle; out parameters must be valid for
/// writes.
#[no_mangle]
pub unsafe extern "C" fn apphandlers_all_applications(
	bridge: *const BridgeHandle,
	out_apps: *mut *mut CAppInfo,
	out_count: *mut u32,
	out_error: *mut *mut c_char,
) -> i32 {
	run(out_error, || {
		let handle = borrow(bridge)?;
		let (items_slot, count_slot) = array_slots(out_apps, out_count)?;
		let apps = handle.bridge().all_applications()?;
		let (items, count) = value::export_app_infos(&apps)?;
		items_slot.write(items);
		count_slot.write(count);
		Ok(())
	})
}

/// Every document type the application declares it can handle, in manifest
/// order.
///
/// SAFETY: as [`apphandlers_all_applications`]; `app_path` must be null or
/// a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn apphandlers_supported_document_types(
	bridge: *const BridgeHandle,
	app_path: *const c_char,
	out_doc_types: *mut *mut CDocumentType,
	out_count: *mut u32,
	out_error: *mut *mut c_char,
) -> i32 {
	run(out_error, || {
		let handle = borrow(bridge)?;
		let (items_slot, count_slot) = array_slots(out_doc_types, out_count)?;
		let docs = handle.bridge().supported_document_types(decode(app_path))?;
		let (items, count) = value::export_document_types(&docs)?;
		items_slot.write(items);
		count_slot.write(count);
		Ok(())
	})
}

/// The subset of declared document types the application is the current
/// system default for, with identifier and extension lists narrowed to the
/// matching subset.
///
/// SAFETY: as [`apphandlers_supported_document_types`].
#[no_mangle]
pub unsafe extern "C" fn apphandlers_default_document_types(
	bridge: *const BridgeHandle,
	app_path: *const c_char,
	out_doc_types: *mut *mut CDocumentType,
	out_count: *mut u32,
	out_error: *mut *mut c_char,
) -> i32 {
	run(out_error, || {
		let handle = borrow(bridge)?;
		let (items_slot, count_slot) = array_slots(out_doc_types, out_count)?;
		let docs = handle.bridge().default_document_types(decode(app_path))?;
		let (items, count) = value::export_document_types(&docs)?;
		items_slot.write(items);
		count_slot.write(count);
		Ok(())
	})
}

/// Release a single string produced by any operation.
///
/// SAFETY: `string` must be null or owned by the caller and released at
/// most once.
#[no_mangle]
pub unsafe extern "C" fn apphandlers_string_free(string: *mut c_char) {
	value::release_string(string);
}

/// Release a string array of exactly `count` elements plus its container.
/// Releasing `(null, 0)` is a no-op.
///
/// SAFETY: `(strings, count)` must be a pair produced by one operation and
/// released at most once.
#[no_mangle]
pub unsafe extern "C" fn apphandlers_string_array_free(strings: *mut *mut c_char, count: u32) {
	value::release_string_array(strings, count);
}

/// Deep-release an application-record array.
///
/// SAFETY: as [`apphandlers_string_array_free`].
#[no_mangle]
pub unsafe extern "C" fn apphandlers_app_info_array_free(apps: *mut CAppInfo, count: u32) {
	value::release_app_info_array(apps, count);
}

/// Deep-release a document-type-record array.
///
/// SAFETY: as [`apphandlers_string_array_free`].
#[no_mangle]
pub unsafe extern "C" fn apphandlers_document_type_array_free(
	doc_types: *mut CDocumentType,
	count: u32,
) {
	value::release_document_type_array(doc_types, count);
}
