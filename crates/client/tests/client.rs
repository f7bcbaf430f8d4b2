//! Drives every operation through the real C boundary and back into owned
//! Rust values.

use apphandlers_client::{BridgeClient, ClientError};
use apphandlers_core::{
	AppInfo, DeclaredDocumentType, HandlerTarget, MemoryRegistry, ResultCode, Role,
	SetDefaultBehavior,
};

const TEXTEDIT: &str = "/System/Applications/TextEdit.app";
const SAFARI: &str = "/Applications/Safari.app";

fn registry() -> MemoryRegistry {
	MemoryRegistry::new()
		.with_type("public.plain-text", Some("txt"), &["txt", "text"])
		.with_type("public.html", Some("html"), &["html", "htm"])
		.with_extension("txt", &["public.plain-text"])
		.with_extension("html", &["public.html"])
		.with_default(HandlerTarget::Uti("public.plain-text"), TEXTEDIT)
		.with_default(HandlerTarget::Scheme("https"), SAFARI)
		.with_capable_handlers(
			HandlerTarget::Uti("public.plain-text"),
			&[TEXTEDIT, SAFARI],
		)
		.with_capable_handlers(HandlerTarget::Scheme("https"), &[SAFARI])
		.with_application(AppInfo {
			name: "TextEdit".into(),
			path: TEXTEDIT.into(),
			bundle_id: "com.apple.TextEdit".into(),
		})
		.with_application(AppInfo {
			name: "Safari".into(),
			path: SAFARI.into(),
			bundle_id: "com.apple.Safari".into(),
		})
		.with_manifest(
			TEXTEDIT,
			vec![
				DeclaredDocumentType {
					type_name: Some("Plain Text".to_owned()),
					role: Some("Editor".to_owned()),
					handler_rank: Some("Owner".to_owned()),
					content_types: vec!["public.plain-text".to_owned()],
					..Default::default()
				},
				DeclaredDocumentType {
					type_name: Some("Web Page".to_owned()),
					role: Some("Viewer".to_owned()),
					content_types: vec!["public.html".to_owned()],
					..Default::default()
				},
			],
		)
}

#[test]
fn default_handler_queries_round_trip() {
	let client = BridgeClient::new(registry());

	assert_eq!(client.default_app_for_uti("public.plain-text").unwrap(), TEXTEDIT);
	assert_eq!(client.default_app_for_scheme("https").unwrap(), SAFARI);
}

#[test]
fn unknown_type_surfaces_code_and_diagnostic() {
	let client = BridgeClient::new(registry());

	let err = client.default_app_for_uti("com.example.unknown").unwrap_err();
	assert_eq!(err.code, ResultCode::InvalidType);
	assert!(err.message.contains("com.example.unknown"));
	assert_eq!(
		err.to_string(),
		format!("bridge error (code -2): {}", err.message)
	);
}

#[test]
fn no_default_is_not_found() {
	let client = BridgeClient::new(registry());

	let err = client.default_app_for_uti("public.html").unwrap_err();
	assert_eq!(err.code, ResultCode::NotFound);
}

#[test]
fn malformed_scheme_is_rejected() {
	let client = BridgeClient::new(registry());

	let err = client.default_app_for_scheme("not a scheme").unwrap_err();
	assert_eq!(err.code, ResultCode::InvalidScheme);
}

#[test]
fn extension_and_type_resolution_round_trip() {
	let client = BridgeClient::new(registry());

	assert_eq!(
		client.utis_for_extension("txt").unwrap(),
		vec!["public.plain-text"]
	);
	assert_eq!(
		client.extensions_for_uti("public.plain-text").unwrap(),
		vec!["text", "txt"]
	);
}

#[test]
fn unmatched_extension_is_not_found() {
	let client = BridgeClient::new(registry());

	let err = client.utis_for_extension("zzz").unwrap_err();
	assert_eq!(err.code, ResultCode::NotFound);
	assert!(err.message.contains("zzz"));
}

#[test]
fn capable_handler_lists_round_trip() {
	let client = BridgeClient::new(registry());

	assert_eq!(
		client.apps_for_uti("public.plain-text").unwrap(),
		vec![TEXTEDIT, SAFARI]
	);
	assert_eq!(client.apps_for_scheme("https").unwrap(), vec![SAFARI]);
}

#[test]
fn installed_applications_rehydrate() {
	let client = BridgeClient::new(registry());

	let apps = client.all_applications().unwrap();
	assert_eq!(apps.len(), 2);
	assert_eq!(apps[0].name, "TextEdit");
	assert_eq!(apps[0].path, std::path::PathBuf::from(TEXTEDIT));
	assert_eq!(apps[1].bundle_id, "com.apple.Safari");
}

#[test]
fn document_types_rehydrate_with_parsed_role_and_rank() {
	let client = BridgeClient::new(registry());

	let docs = client.supported_document_types(TEXTEDIT).unwrap();
	assert_eq!(docs.len(), 2);

	assert_eq!(docs[0].type_name, "Plain Text");
	assert_eq!(docs[0].role, Role::Editor);
	assert_eq!(
		docs[0].handler_rank.as_ref().map(ToString::to_string),
		Some("Owner".to_owned())
	);
	assert_eq!(docs[0].utis, vec!["public.plain-text"]);
	assert_eq!(docs[0].extensions, vec!["text", "txt"]);

	assert_eq!(docs[1].role, Role::Viewer);
	assert_eq!(docs[1].handler_rank, None);
}

#[test]
fn default_document_types_are_a_narrowed_subset() {
	let client = BridgeClient::new(registry());

	let supported = client.supported_document_types(TEXTEDIT).unwrap();
	let defaults = client.default_document_types(TEXTEDIT).unwrap();

	// TextEdit is only the default for plain text, not for web pages.
	assert_eq!(defaults.len(), 1);
	assert_eq!(defaults[0].type_name, "Plain Text");
	assert_eq!(defaults[0].utis, vec!["public.plain-text"]);
	for doc in &defaults {
		let declared = supported
			.iter()
			.find(|s| s.type_name == doc.type_name)
			.unwrap();
		assert!(doc.utis.iter().all(|uti| declared.utis.contains(uti)));
	}
}

#[test]
fn set_default_round_trips_through_the_boundary() {
	let dir = tempfile::tempdir().unwrap();
	let app = dir.path().join("Editor.app");
	std::fs::create_dir(&app).unwrap();
	let app_str = app.to_str().unwrap();

	let client = BridgeClient::new(registry());
	client.set_default_app_for_uti(app_str, "public.html").unwrap();
	assert_eq!(client.default_app_for_uti("public.html").unwrap(), app_str);
}

#[test]
fn set_default_rejects_missing_application() {
	let client = BridgeClient::new(registry());

	let err = client
		.set_default_app_for_uti("/Applications/Missing.app", "public.plain-text")
		.unwrap_err();
	assert_eq!(err.code, ResultCode::InvalidApp);
	assert!(err.message.contains("Missing.app"));
}

#[test]
fn declined_mutation_surfaces_user_declined() {
	let dir = tempfile::tempdir().unwrap();
	let app = dir.path().join("Editor.app");
	std::fs::create_dir(&app).unwrap();

	let client = BridgeClient::new(
		registry().with_set_default_behavior(SetDefaultBehavior::Decline),
	);
	let err = client
		.set_default_app_for_uti(app.to_str().unwrap(), "public.plain-text")
		.unwrap_err();
	assert_eq!(err.code, ResultCode::UserDeclined);
}

#[test]
fn interior_nul_never_reaches_the_boundary() {
	let client = BridgeClient::new(registry());

	let err: ClientError = client.default_app_for_uti("public\0plain").unwrap_err();
	assert_eq!(err.code, ResultCode::System);
}
