use tokio::sync::watch;

/// Monotonic request tokens for one logical search.
///
/// Every issued request takes a fresh token; a response may only be applied
/// while its token is still the latest and the owner has not been torn down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSequence {
    latest: u64,
    closed: bool,
}

impl RequestSequence {
    /// Take a token for a new request, superseding all earlier ones.
    /// Returns `None` once the owner is closed.
    pub fn issue(&mut self) -> Option<u64> {
        if self.closed {
            return None;
        }
        self.latest += 1;
        Some(self.latest)
    }

    /// Supersede any in-flight request without issuing a new one.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn close(&mut self) {
        self.closed = true;
        self.latest += 1;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_current(&self, token: u64) -> bool {
        !self.closed && self.latest == token
    }
}

/// State published through a watch channel that carries its own request sequence.
pub(crate) trait Sequenced {
    fn sequence(&mut self) -> &mut RequestSequence;
}

/// Apply `f` to the published state only if `token` is still current.
///
/// The check and the mutation happen under the channel's lock, so a newer
/// request or a teardown cannot slip in between them.
pub(crate) fn apply_if_current<S, F>(tx: &watch::Sender<S>, token: u64, f: F) -> bool
where
    S: Sequenced,
    F: FnOnce(&mut S),
{
    tx.send_if_modified(|state| {
        if !state.sequence().is_current(token) {
            return false;
        }
        f(state);
        true
    })
}
