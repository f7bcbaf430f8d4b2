use std::fmt;

use thiserror::Error;

use crate::registry::RegistryError;

/// Result codes crossing the foreign-function boundary.
///
/// The values are part of the ABI and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResultCode {
	Ok = 0,
	InvalidApp = -1,
	InvalidType = -2,
	InvalidScheme = -3,
	System = -4,
	UserDeclined = -5,
	NotFound = -6,
}

impl ResultCode {
	/// Decode a raw code received across the boundary.
	#[must_use]
	pub const fn from_raw(raw: i32) -> Option<Self> {
		match raw {
			0 => Some(Self::Ok),
			-1 => Some(Self::InvalidApp),
			-2 => Some(Self::InvalidType),
			-3 => Some(Self::InvalidScheme),
			-4 => Some(Self::System),
			-5 => Some(Self::UserDeclined),
			-6 => Some(Self::NotFound),
			_ => None,
		}
	}
}

impl fmt::Display for ResultCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", *self as i32)
	}
}

/// Unified error type for every bridge operation.
///
/// The `Display` string doubles as the diagnostic text exposed across the
/// boundary; callers must branch on [`Error::code`], never on the text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
	#[error("invalid application path: '{0}'")]
	InvalidApp(String),
	#[error("invalid or unknown type identifier: '{0}'")]
	InvalidType(String),
	#[error("invalid URL scheme: '{0}'")]
	InvalidScheme(String),
	#[error("{0}")]
	System(String),
	#[error("user declined to change the default handler")]
	UserDeclined,
	#[error("no default handler for '{0}'")]
	NotFound(String),
}

impl Error {
	#[must_use]
	pub const fn code(&self) -> ResultCode {
		match self {
			Self::InvalidApp(_) => ResultCode::InvalidApp,
			Self::InvalidType(_) => ResultCode::InvalidType,
			Self::InvalidScheme(_) => ResultCode::InvalidScheme,
			Self::System(_) => ResultCode::System,
			Self::UserDeclined => ResultCode::UserDeclined,
			Self::NotFound(_) => ResultCode::NotFound,
		}
	}
}

impl From<RegistryError> for Error {
	fn from(err: RegistryError) -> Self {
		match err {
			RegistryError::UnknownType(uti) => Self::InvalidType(uti),
			RegistryError::ManifestUnreadable { .. } => Self::InvalidApp(err.to_string()),
			RegistryError::Failure(message) => Self::System(message),
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn codes_are_stable() {
		assert_eq!(ResultCode::Ok as i32, 0);
		assert_eq!(ResultCode::InvalidApp as i32, -1);
		assert_eq!(ResultCode::InvalidType as i32, -2);
		assert_eq!(ResultCode::InvalidScheme as i32, -3);
		assert_eq!(ResultCode::System as i32, -4);
		assert_eq!(ResultCode::UserDeclined as i32, -5);
		assert_eq!(ResultCode::NotFound as i32, -6);
	}

	#[test]
	fn raw_round_trip() {
		for code in [
			ResultCode::Ok,
			ResultCode::InvalidApp,
			ResultCode::InvalidType,
			ResultCode::InvalidScheme,
			ResultCode::System,
			ResultCode::UserDeclined,
			ResultCode::NotFound,
		] {
			assert_eq!(ResultCode::from_raw(code as i32), Some(code));
		}
		assert_eq!(ResultCode::from_raw(1), None);
		assert_eq!(ResultCode::from_raw(-7), None);
	}

	#[test]
	fn registry_errors_map_to_codes() {
		assert_eq!(
			Error::from(RegistryError::UnknownType("com.example.x".into())).code(),
			ResultCode::InvalidType
		);
		assert_eq!(
			Error::from(RegistryError::ManifestUnreadable {
				path: "/Applications/Gone.app".into(),
				reason: "no such file".into(),
			})
			.code(),
			ResultCode::InvalidApp
		);
		assert_eq!(
			Error::from(RegistryError::Failure("boom".into())).code(),
			ResultCode::System
		);
	}
}
