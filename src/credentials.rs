//! Cookie and User-Agent resolution for sites behind a browser check.

use std::path::PathBuf;

use crate::error::{Error, Result};

const COOKIE_PROMPT: &str = "Cookie header (press Enter to skip): ";
const USER_AGENT_PROMPT: &str = "User-Agent (press Enter to use default): ";

/// Source of interactive answers.
pub trait Prompter {
    /// Returns true if a human can answer prompts.
    fn is_interactive(&self) -> bool;

    /// Asks once and returns the answer, or `None` if nothing could be read.
    fn prompt(&self, message: &str) -> Option<String>;
}

/// Prompter for unattended runs; never asks anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn is_interactive(&self) -> bool {
        false
    }

    fn prompt(&self, _message: &str) -> Option<String> {
        None
    }
}

/// Resolved request identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Cookie header value, if any.
    pub cookie: Option<String>,
    /// User-Agent header value.
    pub user_agent: String,
}

/// Raw inputs from flags and configuration.
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    /// Cookie given on the command line.
    pub cookie: Option<String>,
    /// File holding the cookie; takes precedence over `cookie`.
    pub cookie_file: Option<PathBuf>,
    /// User-Agent given on the command line.
    pub user_agent: Option<String>,
    /// User-Agent used when nothing else is supplied.
    pub default_user_agent: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolves the cookie and User-Agent, prompting at most once for each and
/// only for values that were not supplied at all.
///
/// # Errors
///
/// Returns [`Error::CookieFile`] if the cookie file cannot be read.
pub fn resolve_credentials(
    sources: CredentialSources,
    prompter: &dyn Prompter,
) -> Result<Credentials> {
    // A supplied value never prompts, even when it is blank.
    let cookie_supplied = sources.cookie.is_some() || sources.cookie_file.is_some();
    let mut cookie = non_blank(sources.cookie);
    if let Some(path) = sources.cookie_file {
        let contents = std::fs::read_to_string(&path)
            .map_err(|source| Error::CookieFile { path, source })?;
        cookie = non_blank(Some(contents));
    }

    let interactive = prompter.is_interactive();
    if !cookie_supplied && interactive {
        cookie = non_blank(prompter.prompt(COOKIE_PROMPT));
    }

    let user_agent_supplied = sources.user_agent.is_some();
    let mut user_agent = non_blank(sources.user_agent);
    if !user_agent_supplied && interactive {
        user_agent = non_blank(prompter.prompt(USER_AGENT_PROMPT));
    }

    Ok(Credentials {
        cookie,
        user_agent: user_agent.unwrap_or(sources.default_user_agent),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io::Write;

    struct Scripted {
        answers: RefCell<VecDeque<&'static str>>,
        asked: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(answers: &[&'static str]) -> Self {
            Self {
                answers: RefCell::new(answers.iter().copied().collect()),
                asked: RefCell::new(Vec::new()),
            }
        }
    }

    impl Prompter for Scripted {
        fn is_interactive(&self) -> bool {
            true
        }

        fn prompt(&self, message: &str) -> Option<String> {
            self.asked.borrow_mut().push(message.to_string());
            self.answers.borrow_mut().pop_front().map(String::from)
        }
    }

    fn sources() -> CredentialSources {
        CredentialSources {
            default_user_agent: "Default/1.0".to_string(),
            ..CredentialSources::default()
        }
    }

    #[test]
    fn non_interactive_uses_defaults() {
        let creds = resolve_credentials(sources(), &NonInteractive).unwrap();
        assert_eq!(creds.cookie, None);
        assert_eq!(creds.user_agent, "Default/1.0");
    }

    #[test]
    fn flags_skip_prompts() {
        let prompter = Scripted::new(&[]);
        let creds = resolve_credentials(
            CredentialSources {
                cookie: Some(" a=1 ".into()),
                user_agent: Some("Agent/2".into()),
                ..sources()
            },
            &prompter,
        )
        .unwrap();

        assert_eq!(creds.cookie.as_deref(), Some("a=1"));
        assert_eq!(creds.user_agent, "Agent/2");
        assert!(prompter.asked.borrow().is_empty());
    }

    #[test]
    fn prompts_once_each_when_missing() {
        let prompter = Scripted::new(&["cf_clearance=xyz", ""]);
        let creds = resolve_credentials(sources(), &prompter).unwrap();

        assert_eq!(creds.cookie.as_deref(), Some("cf_clearance=xyz"));
        assert_eq!(creds.user_agent, "Default/1.0");
        assert_eq!(*prompter.asked.borrow(), [COOKIE_PROMPT, USER_AGENT_PROMPT]);
    }

    #[test]
    fn empty_answer_means_no_cookie() {
        let prompter = Scripted::new(&["   ", "Typed/3"]);
        let creds = resolve_credentials(sources(), &prompter).unwrap();
        assert_eq!(creds.cookie, None);
        assert_eq!(creds.user_agent, "Typed/3");
    }

    #[test]
    fn blank_supplied_cookie_is_not_prompted_for() {
        let prompter = Scripted::new(&["typed=1"]);
        let creds = resolve_credentials(
            CredentialSources {
                cookie: Some(String::new()),
                user_agent: Some("Agent/2".into()),
                ..sources()
            },
            &prompter,
        )
        .unwrap();

        assert_eq!(creds.cookie, None);
        assert!(prompter.asked.borrow().is_empty());
    }

    #[test]
    fn blank_cookie_file_is_not_prompted_for() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let prompter = Scripted::new(&[""]);
        let creds = resolve_credentials(
            CredentialSources {
                cookie_file: Some(file.path().to_path_buf()),
                ..sources()
            },
            &prompter,
        )
        .unwrap();

        assert_eq!(creds.cookie, None);
        assert_eq!(*prompter.asked.borrow(), [USER_AGENT_PROMPT]);
    }

    #[test]
    fn cookie_file_overrides_flag() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "from_file=1").unwrap();

        let creds = resolve_credentials(
            CredentialSources {
                cookie: Some("from_flag=1".into()),
                cookie_file: Some(file.path().to_path_buf()),
                ..sources()
            },
            &NonInteractive,
        )
        .unwrap();
        assert_eq!(creds.cookie.as_deref(), Some("from_file=1"));
    }

    #[test]
    fn unreadable_cookie_file_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = resolve_credentials(
            CredentialSources {
                cookie_file: Some(dir.path().join("missing.txt")),
                ..sources()
            },
            &NonInteractive,
        )
        .unwrap_err();
        assert!(matches!(err, Error::CookieFile { .. }));
    }
}
