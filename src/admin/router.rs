//! Mutation Router - the write path of observable fields.
//!
//! ```text
//! write(name, v)
//!   ├─ lookup cell ─────────────── missing/computed → UnknownProperty
//!   ├─ object guards (Update) ──── veto → Ok(()), nothing happens
//!   ├─ cell.prepare_new_value ──── cell guards + coercion + equality
//!   │                              unchanged → Ok(())
//!   ├─ spy start
//!   ├─ cell.set_new_value ──────── commit, signal graph, cell listeners
//!   ├─ object listeners
//!   └─ spy end
//! ```

use std::rc::Rc;

use super::{Administration, CellRef};
use crate::cell::ObservableValue;
use crate::error::Result;
use crate::pipeline::{ChangeKind, ObjectDidChange, ObjectWillChange};
use crate::spy::{is_spy_enabled, spy_report_end, spy_report_start};
use crate::types::Value;

impl Administration {
    /// Write `value` to the observable field `name`.
    pub fn write(&self, name: &str, value: Value) -> Result<()> {
        let cell = self.observable_cell(name)?;
        let mut value = value;

        if self.has_interceptors() {
            let owner = self.owner_or_err()?;
            match self
                .interceptors()
                .run(ObjectWillChange::update(owner, name, value))
            {
                Some(change) => value = change.new_value,
                None => {
                    tracing::trace!(object = %self.label(), property = name, "write vetoed");
                    return Ok(());
                }
            }
        }

        let Some(new_value) = cell.prepare_new_value(value)? else {
            return Ok(());
        };

        let notify = self.has_listeners();
        let report = is_spy_enabled();
        let change = if notify || report {
            Some(ObjectDidChange {
                kind: ChangeKind::Update,
                object: self.owner_or_err()?,
                name: name.to_string(),
                new_value: new_value.clone(),
                old_value: Some(cell.value()),
            })
        } else {
            None
        };

        if report && let Some(change) = &change {
            spy_report_start(self.label(), change);
        }

        cell.set_new_value(new_value);

        if notify && let Some(change) = &change {
            self.listeners().notify(change);
        }
        if report {
            spy_report_end();
        }
        Ok(())
    }

    /// Tell listeners and spies about a freshly installed field.
    pub(crate) fn notify_addition(&self, name: &str, new_value: Value) -> Result<()> {
        let notify = self.has_listeners();
        let report = is_spy_enabled();
        if !notify && !report {
            return Ok(());
        }

        let change = ObjectDidChange {
            kind: ChangeKind::Add,
            object: self.owner_or_err()?,
            name: name.to_string(),
            new_value,
            old_value: None,
        };
        if report {
            spy_report_start(self.label(), &change);
        }
        if notify {
            self.listeners().notify(&change);
        }
        if report {
            spy_report_end();
        }
        Ok(())
    }

    fn observable_cell(&self, name: &str) -> Result<Rc<ObservableValue>> {
        match self.cell(name) {
            Some(CellRef::Observable(cell)) => Ok(cell),
            Some(CellRef::Computed(_)) | None => Err(self.unknown(name)),
        }
    }
}
