use std::collections::HashMap;

use crate::lingo::datum::Datum;

use super::events::dispatch_event_to_instance_quiet;
use super::script::find_instance_handler;
use super::{MoviePlayer, ScriptError, ScriptErrorCode};

/// A named recurring timer. `last_fired` is in scheduler milliseconds;
/// the manager never sleeps, it is polled with explicit `now` values.
pub struct Timeout {
    pub name: String,
    pub period_ms: u32,
    pub handler: String,
    pub target: Option<Datum>,
    pub last_fired: u64,
}

pub struct TimeoutManager {
    timeouts: HashMap<String, Timeout>,
}

impl TimeoutManager {
    pub fn new() -> TimeoutManager {
        TimeoutManager {
            timeouts: HashMap::new(),
        }
    }

    pub fn create(
        &mut self,
        name: &str,
        period_ms: u32,
        handler: &str,
        target: Option<Datum>,
        now: u64,
    ) {
        self.timeouts.insert(
            name.to_string(),
            Timeout {
                name: name.to_string(),
                period_ms,
                handler: handler.to_string(),
                target,
                last_fired: now,
            },
        );
    }

    pub fn forget(&mut self, name: &str) {
        self.timeouts.remove(name);
    }

    pub fn get(&self, name: &str) -> Option<&Timeout> {
        self.timeouts.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Timeout> {
        self.timeouts.get_mut(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.timeouts.keys().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.timeouts.clear();
    }

    /// Timers due at `now`. Each is re-armed as it is collected; handlers
    /// run from a snapshot so one firing cannot starve another.
    pub fn collect_due(&mut self, now: u64) -> Vec<(String, String, Option<Datum>)> {
        let mut due = vec![];
        let names = self.names();
        for name in names {
            if let Some(timeout) = self.timeouts.get_mut(&name) {
                if timeout.period_ms == 0 {
                    continue;
                }
                if now.saturating_sub(timeout.last_fired) >= timeout.period_ms as u64 {
                    timeout.last_fired = now;
                    due.push((
                        timeout.name.clone(),
                        timeout.handler.clone(),
                        timeout.target.clone(),
                    ));
                }
            }
        }
        due
    }

    /// Targets for system-event fan-out (prepareFrame/exitFrame).
    pub fn targets(&self) -> Vec<(String, Option<Datum>)> {
        self.timeouts
            .values()
            .map(|timeout| (timeout.name.clone(), timeout.target.clone()))
            .collect()
    }
}

impl Default for TimeoutManager {
    fn default() -> Self {
        TimeoutManager::new()
    }
}

/// Fires every timer due at `now`. Instance targets get the handler with
/// an ancestor walk; anything else goes through the global handler path.
pub fn process_timeouts(player: &mut MoviePlayer, now: u64) {
    let due = player.timeout_manager.collect_due(now);
    for (name, handler, target) in due {
        let timeout_ref = Datum::Timeout(name.clone());
        let result = fire_timeout(player, &handler, target, timeout_ref);
        if let Err(err) = result {
            player.on_script_error(&err);
        }
    }
}

fn fire_timeout(
    player: &mut MoviePlayer,
    handler: &str,
    target: Option<Datum>,
    timeout_ref: Datum,
) -> Result<(), ScriptError> {
    if let Some(Datum::Instance(instance_ref)) = &target {
        let found = {
            let cast_manager = &player.movie.cast_manager;
            find_instance_handler(instance_ref, handler, &|member_ref| {
                cast_manager.get_script_by_ref(member_ref)
            })
        };
        if let Some((receiver, handler_ref)) = found {
            player.call_handler_ref(Some(receiver), &handler_ref, vec![timeout_ref])?;
            return Ok(());
        }
    }
    match player.call_global_handler(handler, &[timeout_ref]) {
        Ok(_) => Ok(()),
        // a vanished handler stops the timer from erroring every period
        Err(err) if err.code == ScriptErrorCode::HandlerNotFound => Ok(()),
        Err(err) => Err(err),
    }
}

/// System-event fan-out to timeout targets: a handler named like the
/// event, empty args, and silence on a miss.
pub fn dispatch_system_event(player: &mut MoviePlayer, name: &str) {
    for (_, target) in player.timeout_manager.targets() {
        if let Some(Datum::Instance(instance_ref)) = target {
            if let Err(err) = dispatch_event_to_instance_quiet(player, &instance_ref, name, &[]) {
                player.on_script_error(&err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firing_follows_the_period() {
        let mut manager = TimeoutManager::new();
        manager.create("t", 10, "pulse", None, 100);
        assert!(manager.collect_due(100).is_empty());
        assert!(manager.collect_due(109).is_empty());
        assert_eq!(manager.collect_due(110).len(), 1);
        // re-armed at 110: next due at 120
        assert!(manager.collect_due(115).is_empty());
        assert_eq!(manager.collect_due(120).len(), 1);
    }

    #[test]
    fn forget_removes_the_timer() {
        let mut manager = TimeoutManager::new();
        manager.create("t", 10, "pulse", None, 0);
        manager.forget("t");
        assert!(manager.collect_due(100).is_empty());
    }
}
