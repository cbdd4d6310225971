use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use cafe_domain::conversation::{self, ConversationTurn};

use crate::{BoxFuture, Result};

/// Per-session turn logs. Implementations must keep sessions isolated from each other.
pub trait SessionStore
where
	Self: Send + Sync,
{
	fn history<'a>(&'a self, session_id: &'a str) -> BoxFuture<'a, Result<Vec<ConversationTurn>>>;

	/// Appends `turns` in order, then keeps only the most recent `max_turns` entries.
	fn append<'a>(
		&'a self,
		session_id: &'a str,
		turns: Vec<ConversationTurn>,
		max_turns: usize,
	) -> BoxFuture<'a, Result<()>>;

	fn clear<'a>(&'a self, session_id: &'a str) -> BoxFuture<'a, Result<()>>;
}

/// Process-local store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
	sessions: Mutex<HashMap<String, Vec<ConversationTurn>>>,
}
impl MemorySessionStore {
	pub fn session_count(&self) -> usize {
		self.sessions.lock().unwrap_or_else(|err| err.into_inner()).len()
	}
}

impl SessionStore for MemorySessionStore {
	fn history<'a>(&'a self, session_id: &'a str) -> BoxFuture<'a, Result<Vec<ConversationTurn>>> {
		let turns = self
			.sessions
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.get(session_id)
			.cloned()
			.unwrap_or_default();

		Box::pin(async move { Ok(turns) })
	}

	fn append<'a>(
		&'a self,
		session_id: &'a str,
		turns: Vec<ConversationTurn>,
		max_turns: usize,
	) -> BoxFuture<'a, Result<()>> {
		{
			let mut sessions = self.sessions.lock().unwrap_or_else(|err| err.into_inner());
			let log = sessions.entry(session_id.to_string()).or_default();

			log.extend(turns);
			conversation::retain_recent(log, max_turns);
		}

		Box::pin(async { Ok(()) })
	}

	fn clear<'a>(&'a self, session_id: &'a str) -> BoxFuture<'a, Result<()>> {
		self.sessions.lock().unwrap_or_else(|err| err.into_inner()).remove(session_id);

		Box::pin(async { Ok(()) })
	}
}

/// One async lock per session id, used to run exchanges on a session one at a time.
#[derive(Debug, Default)]
pub struct SessionLocks {
	locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}
impl SessionLocks {
	pub async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
		let lock = {
			let mut locks = self.locks.lock().unwrap_or_else(|err| err.into_inner());

			locks.entry(session_id.to_string()).or_default().clone()
		};

		lock.lock_owned().await
	}

	/// Drops the lock entry when no exchange holds or awaits it.
	pub fn forget(&self, session_id: &str) {
		let mut locks = self.locks.lock().unwrap_or_else(|err| err.into_inner());

		if locks.get(session_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
			locks.remove(session_id);
		}
	}
}
