/**
 * Process-wide client registry.
 *
 * Instead of a hidden global, the singleton is an explicit value the
 * application declares where it wants it — typically a `static`:
 *
 * ```ignore
 * use courier_core::{Config, Registry};
 *
 * static TELEMETRY: Registry<MyEvent> = Registry::new();
 *
 * fn main() {
 *     if let Err(err) = TELEMETRY.setup(config_from_somewhere()) {
 *         eprintln!("telemetry disabled: {err}");
 *     }
 *
 *     TELEMETRY.send(MyEvent::started());
 *     // ...
 *     TELEMETRY.close();
 * }
 * ```
 *
 * Lifecycle is uninitialized → configured, moved exactly once by `setup`.
 * Before setup — and after a setup that failed validation — `send` and
 * `close` are silent no-ops, so call sites never need to check.
 */
use std::sync::OnceLock;

use serde::Serialize;

use crate::client::Client;
use crate::config::Config;
use crate::error::Error;

/**
 * A configure-once slot holding the process's shared `Client`.
 *
 * `new` is `const`, so a registry can live in a `static`. All operations
 * take `&self`.
 */
pub struct Registry<E> {
    slot: OnceLock<Client<E>>,
}

impl<E> Registry<E>
where
    E: Serialize + Send + 'static,
{
    /// An unconfigured registry.
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /**
     * Configures the registry's client. Succeeds exactly once.
     *
     * - A second call fails with `Error::AlreadyConfigured` and leaves the
     *   existing instance untouched.
     * - On invalid configuration the named validation error is returned
     *   and a disabled client occupies the slot, so `send`/`close` stay
     *   safe no-ops (and later setup attempts report `AlreadyConfigured`).
     */
    pub fn setup(&self, config: Config) -> Result<(), Error> {
        if self.slot.get().is_some() {
            return Err(Error::AlreadyConfigured);
        }

        match Client::new(config) {
            Ok(client) => match self.slot.set(client) {
                Ok(()) => Ok(()),
                /* Lost the race against a concurrent setup: shut the
                 * freshly built pipeline down before discarding it. */
                Err(client) => {
                    client.close();
                    Err(Error::AlreadyConfigured)
                }
            },
            Err(err) => {
                let _ = self.slot.set(Client::disabled());
                Err(err)
            }
        }
    }

    /// The configured client, if `setup` has run.
    pub fn get(&self) -> Option<&Client<E>> {
        self.slot.get()
    }

    /// Forwards to the configured client; no-op when unconfigured.
    pub fn send(&self, event: E) {
        if let Some(client) = self.slot.get() {
            client.send(event);
        }
    }

    /// Forwards to the configured client; no-op when unconfigured.
    pub fn close(&self) {
        if let Some(client) = self.slot.get() {
            client.close();
        }
    }
}

impl<E> Default for Registry<E>
where
    E: Serialize + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Ping {
        seq: u32,
    }

    fn valid() -> Config {
        Config {
            endpoint: "http://127.0.0.1:9/events".into(),
            token: "secret".into(),
            ..Config::default()
        }
    }

    #[test]
    fn test_unconfigured_registry_noops() {
        let registry: Registry<Ping> = Registry::new();
        registry.send(Ping { seq: 1 });
        registry.close();
        assert!(registry.get().is_none());
    }

    #[test]
    fn test_setup_succeeds_once() {
        let registry: Registry<Ping> = Registry::new();
        registry.setup(valid()).unwrap();
        assert!(registry.get().is_some());

        assert!(matches!(
            registry.setup(valid()),
            Err(Error::AlreadyConfigured)
        ));

        registry.close();
        /* close is forwarded and idempotent */
        registry.close();
    }

    #[test]
    fn test_failed_setup_leaves_safe_noop() {
        let registry: Registry<Ping> = Registry::new();

        let err = registry.setup(Config::default()).unwrap_err();
        assert!(matches!(err, Error::MissingEndpoint));

        /* The slot is occupied by a disabled client... */
        assert!(!registry.get().unwrap().is_enabled());
        assert!(matches!(
            registry.setup(valid()),
            Err(Error::AlreadyConfigured)
        ));

        /* ...and the global surface stays callable. */
        registry.send(Ping { seq: 1 });
        registry.close();
    }

    #[test]
    fn test_registry_in_a_static() {
        static REGISTRY: Registry<Ping> = Registry::new();

        REGISTRY.send(Ping { seq: 0 });
        let err = REGISTRY
            .setup(Config {
                token: "secret".into(),
                ..Config::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::MissingEndpoint));
        REGISTRY.close();
    }
}
