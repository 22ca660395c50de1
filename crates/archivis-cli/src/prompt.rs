/// Line-based naming prompt.
///
/// Shows a banner with the drive's capacity and proposed codename, then
/// reads one line: empty accepts the proposal, anything else is a custom
/// name. End of input aborts naming for that drive. Collision checks live
/// in the resolver; when it hands back a rejected name the prompt reports
/// it with the reason and asks again.
use archivis_core::identity::{ConfirmName, NameDecision, NameRequest, RejectReason};
use archivis_core::model::size::bytes_to_tib;
use std::io::{BufRead, Write};

pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_answer(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(err) => {
                tracing::warn!("Failed to read naming prompt input: {err}");
                None
            }
        }
    }
}

impl<R: BufRead, W: Write> ConfirmName for LinePrompt<R, W> {
    fn confirm(&mut self, request: &NameRequest<'_>) -> NameDecision {
        // Terminal write failures are not worth aborting a drive over.
        let out = &mut self.output;
        match request.rejected {
            Some(rejected) => {
                let name = rejected.name;
                let _ = match rejected.reason {
                    RejectReason::InUse => writeln!(
                        out,
                        "Error: '{name}' is already in use. Please choose another name."
                    ),
                    RejectReason::Invalid(why) => writeln!(
                        out,
                        "Error: '{name}' cannot be used as a drive name ({why}). Please choose another name."
                    ),
                };
            }
            None => {
                let rule = "=".repeat(60);
                let _ = writeln!(out, "\n{rule}");
                let _ = writeln!(
                    out,
                    "New drive detected: {:.2} TB ({} tier)",
                    bytes_to_tib(request.volume.capacity_bytes),
                    request.tier
                );
                let _ = writeln!(out, "Proposed codename: {}", request.proposed);
                let _ = writeln!(out, "{rule}");
            }
        }
        let _ = write!(
            out,
            "Accept '{}' or enter a custom name [ENTER to accept]: ",
            request.proposed
        );
        let _ = out.flush();

        match self.read_answer() {
            None => {
                let _ = writeln!(self.output);
                NameDecision::Abort
            }
            Some(answer) if answer.is_empty() => NameDecision::Accept,
            Some(answer) => NameDecision::Custom(answer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivis_core::identity::Rejection;
    use archivis_core::model::registry::InvalidId;
    use archivis_core::model::VolumeDescriptor;
    use archivis_core::naming::Tier;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn volume() -> VolumeDescriptor {
        VolumeDescriptor {
            device_identifier: "disk4s2".into(),
            volume_uuid: "U".into(),
            volume_name: "Archive".into(),
            mount_point: PathBuf::from("/Volumes/Archive"),
            capacity_bytes: 2 * 1_099_511_627_776,
            free_bytes: 0,
            file_system: "apfs".into(),
        }
    }

    fn ask(input: &str, rejected: Option<Rejection<'_>>) -> (NameDecision, String) {
        let vol = volume();
        let mut prompt = LinePrompt::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let decision = prompt.confirm(&NameRequest {
            proposed: "NOVA",
            tier: Tier::Medium,
            volume: &vol,
            rejected,
        });
        let output = String::from_utf8(prompt.into_output()).unwrap();
        (decision, output)
    }

    #[test]
    fn empty_line_accepts() {
        let (decision, output) = ask("\n", None);
        assert_eq!(decision, NameDecision::Accept);
        assert!(output.contains("New drive detected: 2.00 TB (medium tier)"));
        assert!(output.contains("Proposed codename: NOVA"));
    }

    #[test]
    fn text_is_a_custom_name() {
        let (decision, _) = ask("  vision \n", None);
        assert_eq!(decision, NameDecision::Custom("vision".into()));
    }

    #[test]
    fn end_of_input_aborts() {
        let (decision, _) = ask("", None);
        assert_eq!(decision, NameDecision::Abort);
    }

    #[test]
    fn rejection_is_explained_without_repeating_banner() {
        let taken = Rejection {
            name: "GROOT",
            reason: RejectReason::InUse,
        };
        let (_, output) = ask("\n", Some(taken));
        assert!(output.contains("'GROOT' is already in use"));
        assert!(!output.contains("New drive detected"));
    }

    #[test]
    fn invalid_name_is_explained() {
        let bad = Rejection {
            name: "../../ESCAPE",
            reason: RejectReason::Invalid(InvalidId::Separator),
        };
        let (decision, output) = ask("vault\n", Some(bad));
        assert!(output.contains(
            "'../../ESCAPE' cannot be used as a drive name (path separators are not allowed)"
        ));
        assert_eq!(decision, NameDecision::Custom("vault".into()));
    }
}
