//! Which variables of a model are visible.

use crate::error::EngineError;

/// Result of a checklist event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The selection was replaced; the figure must be recomposed.
    Accepted,
    /// The new membership was empty; the previous selection (and figure) stays.
    EmptyRejected,
}

/// Visible-variable state of one model.
///
/// The selection is always an ordered subset of the model's Dependent
/// variables, without repeats.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionController {
    model: String,
    options: Vec<String>,
    selected: Vec<String>,
}

impl SelectionController {
    /// `options` are the model's Dependent variables; `initial` names outside
    /// them are ignored.
    pub fn new(model: impl Into<String>, options: Vec<String>, initial: Vec<String>) -> Self {
        let mut selected: Vec<String> = Vec::with_capacity(initial.len());
        for name in initial {
            if options.contains(&name) && !selected.contains(&name) {
                selected.push(name);
            }
        }
        Self {
            model: model.into(),
            options,
            selected,
        }
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.iter().any(|s| s == name)
    }

    /// Replace the selection with `names` (a full membership list, not a delta).
    pub fn apply(&mut self, names: Vec<String>) -> Result<Transition, EngineError> {
        if let Some(unknown) = names.iter().find(|n| !self.options.contains(n)) {
            return Err(EngineError::UnknownVariable {
                model: self.model.clone(),
                variable: unknown.clone(),
            });
        }
        if names.is_empty() {
            return Ok(Transition::EmptyRejected);
        }

        let mut next: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if !next.contains(&name) {
                next.push(name);
            }
        }
        self.selected = next;
        Ok(Transition::Accepted)
    }

    /// Membership list after toggling `name`, as a checklist would report it.
    ///
    /// Newly checked variables are appended; the selection itself is unchanged.
    pub fn toggled(&self, name: &str) -> Vec<String> {
        if self.is_selected(name) {
            self.selected.iter().filter(|s| *s != name).cloned().collect()
        } else {
            let mut next = self.selected.clone();
            next.push(name.to_string());
            next
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn controller() -> SelectionController {
        SelectionController::new("m", names(&["f", "g", "h"]), names(&["g", "zz", "g"]))
    }

    #[test]
    fn initial_selection_is_filtered() {
        assert_eq!(controller().selected(), names(&["g"]).as_slice());
    }

    #[test]
    fn replaces_verbatim_in_given_order() {
        let mut c = controller();
        assert_eq!(c.apply(names(&["h", "f", "h"])).unwrap(), Transition::Accepted);
        assert_eq!(c.selected(), names(&["h", "f"]).as_slice());
    }

    #[test]
    fn empty_is_rejected_without_change() {
        let mut c = controller();
        assert_eq!(c.apply(Vec::new()).unwrap(), Transition::EmptyRejected);
        assert_eq!(c.selected(), names(&["g"]).as_slice());
    }

    #[test]
    fn unknown_names_are_errors() {
        let mut c = controller();
        assert!(c.apply(names(&["f", "x"])).is_err());
        assert_eq!(c.selected(), names(&["g"]).as_slice());
    }

    #[test]
    fn toggled_appends_or_removes() {
        let c = controller();
        assert_eq!(c.toggled("f"), names(&["g", "f"]));
        assert!(c.toggled("g").is_empty());
    }
}
