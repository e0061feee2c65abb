//! Interactive alert responder.
//!
//! Asks the operator on a line-oriented terminal for the category and
//! details of an alert. Invalid answers are asked again; end of input
//! abandons the alert.

use std::io::{BufRead, Write};

use carebook::alert::{AlertCategory, AlertRequest, AlertResponder, AlertResponse, Violation};
use carebook::error::AlertError;
use carebook::threshold::Deviation;

/// [`AlertResponder`] that reads answers from `input` and writes prompts to
/// `output`.
pub struct PromptResponder<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptResponder<R, W> {
    /// Creates a responder over the given streams.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `prompt` and reads one trimmed line.
    fn ask(&mut self, constant: &str, prompt: &str) -> Result<String, AlertError> {
        write!(self.output, "{prompt}").map_err(|source| AlertError::Input { source })?;
        self.output
            .flush()
            .map_err(|source| AlertError::Input { source })?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|source| AlertError::Input { source })?;
        if read == 0 {
            return Err(AlertError::Incomplete {
                constant: constant.to_string(),
                reason: "input ended".to_string(),
            });
        }
        Ok(line.trim().to_string())
    }

    /// Asks until `parse` accepts the answer.
    fn ask_until<T>(
        &mut self,
        constant: &str,
        prompt: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<T, AlertError> {
        loop {
            let answer = self.ask(constant, prompt)?;
            if let Some(value) = parse(&answer) {
                return Ok(value);
            }
            writeln!(self.output, "Invalid answer: {answer:?}")
                .map_err(|source| AlertError::Input { source })?;
        }
    }
}

/// Parses a yes/no answer, accepting Catalan `sí`/`si`.
fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.to_lowercase().as_str() {
        "y" | "yes" | "s" | "si" | "sí" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

impl<R: BufRead, W: Write> AlertResponder for PromptResponder<R, W> {
    fn respond(&mut self, violation: &Violation) -> Result<AlertResponse, AlertError> {
        let measurement = &violation.measurement;
        let constant = measurement.constant.as_str();
        let side = match violation.deviation {
            Deviation::Below => format!("below the minimum {}", violation.bounds.min),
            Deviation::Above => format!("above the maximum {}", violation.bounds.max),
        };
        writeln!(
            self.output,
            "{constant} = {} for user {} is {side}.",
            measurement.value, measurement.user_id
        )
        .map_err(|source| AlertError::Input { source })?;

        let category = self.ask_until(
            constant,
            "Alert type (1: urgent, 2: medical-staff, 3: caregiver): ",
            |answer| answer.parse::<AlertCategory>().ok(),
        )?;
        let contact_number = self.ask_until(constant, "Contact phone number: ", |answer| {
            (!answer.is_empty()).then(|| answer.to_string())
        })?;

        let request = match category {
            AlertCategory::Urgent => AlertRequest::Urgent {
                ambulance_required: self.ask_until(
                    constant,
                    "Is an ambulance required? (yes/no): ",
                    parse_yes_no,
                )?,
                clinical_history_code: self.ask(constant, "Clinical history code: ")?,
            },
            AlertCategory::MedicalStaff => AlertRequest::MedicalStaff {
                message: self.ask(constant, "Message for the medical team: ")?,
            },
            AlertCategory::Caregiver => AlertRequest::Caregiver {
                instructions: self.ask(constant, "Instructions for the caregiver: ")?,
            },
        };

        Ok(AlertResponse {
            contact_number,
            request,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carebook::model::Measurement;
    use carebook::threshold::{Bounds, Threshold};
    use std::io::Cursor;

    fn violation() -> Violation {
        Violation {
            measurement: Measurement::new("1", "heart_rate", 45.0, "T1"),
            threshold: Threshold::range("heart_rate", Some(60.0), Some(100.0)),
            bounds: Bounds {
                min: 60.0,
                max: 100.0,
            },
            deviation: Deviation::Below,
        }
    }

    #[test]
    fn test_urgent_answers() {
        let input = Cursor::new("4\nurgent\n112\nmaybe\nsí\nHC-9\n");
        let mut output = Vec::new();
        let response = PromptResponder::new(input, &mut output)
            .respond(&violation())
            .unwrap();

        assert_eq!(response.contact_number, "112");
        assert_eq!(
            response.request,
            AlertRequest::Urgent {
                ambulance_required: true,
                clinical_history_code: "HC-9".to_string(),
            }
        );
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("below the minimum 60"));
        assert!(shown.contains("Invalid answer: \"4\""));
        assert!(shown.contains("Invalid answer: \"maybe\""));
    }

    #[test]
    fn test_caregiver_answers() {
        let input = Cursor::new("3\n600000000\nCall her daughter\n");
        let response = PromptResponder::new(input, Vec::new())
            .respond(&violation())
            .unwrap();
        assert_eq!(
            response.request,
            AlertRequest::Caregiver {
                instructions: "Call her daughter".to_string(),
            }
        );
    }

    #[test]
    fn test_end_of_input_abandons_alert() {
        let input = Cursor::new("2\n");
        let err = PromptResponder::new(input, Vec::new())
            .respond(&violation())
            .unwrap_err();
        assert!(matches!(err, AlertError::Incomplete { .. }));
    }
}
