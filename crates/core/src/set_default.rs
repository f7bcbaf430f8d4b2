//! Synchronous adapter over the asynchronous set-default mutation.
//!
//! The registry resolves the mutation through a one-shot completion
//! callback, possibly after a user-facing prompt. The adapter blocks the
//! calling thread on the receiving half of a single-message channel with a
//! hard upper bound. On timeout the in-flight operation is abandoned, not
//! cancelled: the sender (the completion state) is independently owned by
//! the callback, so a late completion lands in a dropped receiver and is
//! discarded without ever touching reclaimed memory.

use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::registry::{CompletionError, HandlerTarget, TypeRegistry};

pub(crate) const TIMED_OUT_DIAGNOSTIC: &str = "operation timed out";

pub(crate) fn await_set_default<R: TypeRegistry>(
	registry: &R,
	app_path: &Path,
	target: HandlerTarget<'_>,
	timeout: Duration,
) -> Result<()> {
	let (tx, rx) = mpsc::sync_channel::<std::result::Result<(), CompletionError>>(1);

	registry.begin_set_default_handler(
		app_path,
		target,
		Box::new(move |outcome| {
			// A completion arriving after the timed-out wait below sends
			// into a dropped receiver and is discarded.
			let _ = tx.send(outcome);
		}),
	);

	match rx.recv_timeout(timeout) {
		Ok(Ok(())) => {
			debug!(%target, app_path = %app_path.display(), "default handler assigned");
			Ok(())
		}
		Ok(Err(err)) if err.is_user_cancelled() => Err(Error::UserDeclined),
		Ok(Err(err)) => Err(Error::System(err.to_string())),
		Err(_) => {
			warn!(%target, app_path = %app_path.display(), "set-default mutation abandoned after timeout");
			Err(Error::System(TIMED_OUT_DIAGNOSTIC.to_owned()))
		}
	}
}
