use crate::error::StripError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildResult {
    Failure,
    Success,
    Aborted,
}

impl BuildResult {
    fn from_token(token: &str) -> Result<Self, StripError> {
        match token {
            "FAILURE" => Ok(BuildResult::Failure),
            "SUCCESS" => Ok(BuildResult::Success),
            "ABORTED" => Ok(BuildResult::Aborted),
            _ => Err(StripError::UnknownResult(token.to_string())),
        }
    }
}

/// One normalized instruction for the dispatch logic, parsed from a single
/// notification message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    AllOff,
    BuildEvent {
        result: BuildResult,
        stage_name: String,
    },
}

/// Messages look like `Build SUCCESS: Unit Tests #42`, or the literal
/// `all_off`. The build number after the final `#` is ignored.
pub fn parse(message: &str) -> Result<Directive, StripError> {
    let message = message.trim();
    if message == "all_off" {
        return Ok(Directive::AllOff);
    }

    let bad = || StripError::BadDirective(message.to_string());
    let rest = message.strip_prefix("Build ").ok_or_else(bad)?;
    let (token, rest) = rest.split_once(": ").ok_or_else(bad)?;
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(bad());
    }
    let (stage_name, _build_number) = rest.rsplit_once(" #").ok_or_else(bad)?;

    Ok(Directive::BuildEvent {
        result: BuildResult::from_token(token)?,
        stage_name: stage_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_events() {
        assert_eq!(
            parse("Build SUCCESS: Unit Tests #42").unwrap(),
            Directive::BuildEvent {
                result: BuildResult::Success,
                stage_name: "Unit Tests".to_string(),
            }
        );
        assert_eq!(
            parse("Build FAILURE: DT - Deploy Test #7").unwrap(),
            Directive::BuildEvent {
                result: BuildResult::Failure,
                stage_name: "DT - Deploy Test".to_string(),
            }
        );
    }

    #[test]
    fn parses_all_off() {
        assert_eq!(parse("all_off").unwrap(), Directive::AllOff);
        assert_eq!(parse("  all_off\n").unwrap(), Directive::AllOff);
    }

    #[test]
    fn stage_names_may_contain_hashes() {
        assert_eq!(
            parse("Build ABORTED: Deploy #2 ring #9").unwrap(),
            Directive::BuildEvent {
                result: BuildResult::Aborted,
                stage_name: "Deploy #2 ring".to_string(),
            }
        );
    }

    #[test]
    fn unknown_result_token_is_a_lookup_error() {
        let err = parse("Build UNSTABLE: Unit Tests #3").unwrap_err();
        assert!(matches!(err, StripError::UnknownResult(token) if token == "UNSTABLE"));
    }

    #[test]
    fn malformed_messages_are_rejected() {
        for message in ["", "Build SUCCESS", "Build : x #1", "shiny lights please"] {
            assert!(
                matches!(parse(message), Err(StripError::BadDirective(_))),
                "accepted {message:?}"
            );
        }
    }
}
