use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::bridge::InvocationOutcome;

const TITLE: &str = "React Bridge RA";

/// The single consent screen. Shows the prompt while idle, otherwise the
/// outcome of the most recent decision.
#[derive(Debug, Default)]
pub struct Screen {
    outcome: Mutex<Option<InvocationOutcome>>,
}

impl Screen {
    fn slot(&self) -> MutexGuard<'_, Option<InvocationOutcome>> {
        self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A decision can only be made from the idle prompt. Returns false while
    /// an outcome is still on screen.
    pub fn begin_decision(&self) -> bool {
        self.slot().is_none()
    }

    pub fn settle(&self, outcome: InvocationOutcome) {
        *self.slot() = Some(outcome);
    }

    pub fn reset(&self) {
        self.slot().take();
    }

    pub fn current(&self) -> Option<InvocationOutcome> {
        self.slot().clone()
    }

    pub fn render(&self) -> String {
        let body = match &*self.slot() {
            None => "Capture User Biometrics?\n\n[Accept]  [Decline]\n".to_owned(),
            Some(InvocationOutcome::Success(response)) => format!(
                "Success Response :\nresponseStatus : {}\nconsentID : {}\n",
                response.response_status, response.consent_id
            ),
            Some(InvocationOutcome::Failure(error)) => format!(
                "Error Response : \nError Code : {}\nError Message : {}\n",
                error.code, error.message
            ),
            Some(InvocationOutcome::MalformedResponse { reason }) => {
                format!("Error Response : \nMalformed response from activity: {}\n", reason)
            }
            Some(InvocationOutcome::Unreachable { reason }) => {
                format!("Error Response : \nActivity could not be reached: {}\n", reason)
            }
        };
        format!("{}\n\n{}", TITLE, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{Code, ConsentError, ConsentResponse};

    #[test]
    fn idle_shows_prompt() {
        let screen = Screen::default();
        let text = screen.render();
        assert!(text.starts_with("React Bridge RA\n\n"));
        assert!(text.contains("Capture User Biometrics?"));
        assert!(screen.current().is_none());
        assert!(screen.begin_decision());
    }

    #[test]
    fn shows_success() {
        let screen = Screen::default();
        screen.settle(InvocationOutcome::Success(ConsentResponse {
            response_status: Code::from("OK"),
            consent_id: "abc123".to_owned(),
        }));
        let text = screen.render();
        assert!(text.contains("responseStatus : OK"));
        assert!(text.contains("consentID : abc123"));
        assert!(!text.contains("Capture User Biometrics?"));
    }

    #[test]
    fn shows_unreachable() {
        let screen = Screen::default();
        screen.settle(InvocationOutcome::Unreachable {
            reason: "no result within 120 seconds".to_owned(),
        });
        let text = screen.render();
        assert!(text.contains("Activity could not be reached: no result within 120 seconds"));
    }

    #[test]
    fn decisions_only_from_idle() {
        let screen = Screen::default();
        screen.settle(InvocationOutcome::Failure(ConsentError {
            code: Code::from("E1"),
            message: "denied".to_owned(),
        }));
        assert!(screen.render().contains("Error Message : denied"));
        assert!(!screen.begin_decision());
        assert!(screen.current().is_some());

        screen.reset();
        assert!(screen.begin_decision());
        assert!(screen.render().contains("Capture User Biometrics?"));

        screen.settle(InvocationOutcome::MalformedResponse {
            reason: "RESPONSE_DATA missing from response".to_owned(),
        });
        assert!(screen.render().contains("Malformed response from activity"));
    }
}
