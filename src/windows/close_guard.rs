// Unsaved-changes close protection
//
// Guards a window's close request behind a confirmation prompt whenever the
// user has entered data that would be lost. "Unsaved changes" is derived
// lazily, at the moment of the close request, from a set of tracked text
// inputs plus any number of custom predicates - never cached, because the
// user keeps typing between close attempts.

use std::rc::Rc;

use crate::metrics::METRICS;
use crate::windows::registry::{CloseDecision, UiWindow};

/// A text-bearing input whose content counts as an unsaved change.
///
/// Implemented by the frontend for its text fields and areas; whitespace-only
/// content is treated as blank.
pub trait TrackedInput {
    fn text(&self) -> String;
}

/// Additional change-detection rule, evaluated at close-request time.
pub type ChangeCheck = Box<dyn Fn() -> bool>;

/// The confirmation prompt seam.
///
/// The prompt is synchronous relative to the close request: the decision is
/// known before the close request is resolved. Production uses
/// [`NativeConfirmer`]; tests substitute a scripted implementation.
pub trait CloseConfirmer {
    /// Returns true only if the user explicitly confirmed discarding their
    /// changes. Dismissing or cancelling the prompt returns false.
    fn confirm_discard(&self, title: &str, message: &str) -> bool;
}

/// Native modal confirmation dialog.
pub struct NativeConfirmer;

impl CloseConfirmer for NativeConfirmer {
    fn confirm_discard(&self, title: &str, message: &str) -> bool {
        let response = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Warning)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::OkCancel)
            .show();
        response == rfd::MessageDialogResult::Ok
    }
}

/// Install close protection on a window.
///
/// On every close request: if any tracked input is non-blank or any extra
/// check reports true, the confirmer is consulted and anything short of an
/// explicit confirmation vetoes the close. A clean window closes with no
/// prompt at all.
///
/// Install this inside the window factory passed to
/// [`crate::windows::WindowRegistry::open`]; the registry shows the window
/// only after the factory returns, so the guard is active before the window
/// is ever visible and an early close request cannot slip past it.
pub fn require_confirmation_on_close(
    window: &Rc<dyn UiWindow>,
    inputs: Vec<Rc<dyn TrackedInput>>,
    extra_checks: Vec<ChangeCheck>,
    confirmer: Rc<dyn CloseConfirmer>,
) {
    window.set_close_interceptor(Box::new(move || {
        if !has_unsaved_changes(&inputs, &extra_checks) {
            return CloseDecision::Allow;
        }

        let confirmed = confirmer.confirm_discard(
            "Confirm Exit",
            "You have unsaved changes. Are you sure you want to close?",
        );
        if confirmed {
            CloseDecision::Allow
        } else {
            METRICS.record_close_vetoed();
            tracing::debug!("Close request vetoed, unsaved changes kept");
            CloseDecision::Veto
        }
    }));
}

fn has_unsaved_changes(inputs: &[Rc<dyn TrackedInput>], extra_checks: &[ChangeCheck]) -> bool {
    inputs.iter().any(|input| !input.text().trim().is_empty())
        || extra_checks.iter().any(|check| check())
}
