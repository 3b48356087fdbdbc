//! Command router.
//!
//! Classifies one raw line of user input as a local UI action, a
//! backend-bound command (privileged or not), or free-form chat, and picks
//! the transport. Classification is a single dispatcher evaluating an
//! ordered table of (matcher, action) rules, first-match-wins, so the
//! grammar stays testable in isolation from any UI.

use once_cell::sync::Lazy;

/// Panels the client can show or hide locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Scheduler,
    Counselor,
    Branding,
}

/// A pure local state change; never requires a backend call by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalAction {
    ShowPanel(Panel),
    HidePanel(Panel),
    SetVoice(bool),
    ShowHelp,
}

/// Where one line of input should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Local UI state update, plus an optional backend command emitted as a
    /// second, separate step (never intertwined with the state change).
    Local {
        action: LocalAction,
        follow_up: Option<String>,
    },
    /// Explicit consent grant request.
    ConsentGrant,
    /// Explicit consent revocation.
    ConsentRevoke,
    /// Fast-path command: always over HTTP, regardless of socket state.
    HttpCommand { text: String },
    /// Skills listing request against the HTTP skills endpoint.
    ListSkills,
    /// Run one skill by id with the rest of the line as its input.
    RunSkill { skill_id: String, input: String },
    /// Privileged `system `-scoped command; subject to the consent gate
    /// when sent over the socket.
    PrivilegedCommand { text: String },
    /// Ordinary backend command, socket-first with HTTP fallback.
    Command { text: String },
    /// Free-form chat; the only decision that opens a streamed turn.
    Speak { text: String },
}

/// How a rule matches the (lowercased, trimmed) input line.
enum Matcher {
    /// Whole-line match.
    Exact(&'static str),
    /// Line starts with the given phrase.
    Prefix(&'static str),
    /// Line starts with the `/` command marker.
    CommandMarker,
    /// Line contains one of the control verbs as a standalone word.
    ControlVerb,
    /// Always matches; the table's final catch-all.
    Always,
}

/// What a matched rule resolves to. The original input text (trimmed, with
/// its original casing) is attached by the dispatcher where needed.
enum RuleAction {
    Local(LocalAction, Option<&'static str>),
    ConsentGrant,
    ConsentRevoke,
    HttpCommand,
    ListSkills,
    RunSkill,
    PrivilegedCommand,
    Command,
    Speak,
}

struct RouteRule {
    matcher: Matcher,
    action: RuleAction,
}

const CONTROL_VERBS: &[&str] = &["run", "execute", "schedule"];

/// The ordered routing table. Earlier rules win.
static ROUTING_TABLE: Lazy<Vec<RouteRule>> = Lazy::new(|| {
    use LocalAction::*;
    use Matcher::*;
    use RuleAction as A;

    vec![
        // Local UI toggles; showing the scheduler additionally refreshes
        // the task list from the backend as a separate follow-up command.
        RouteRule {
            matcher: Exact("help"),
            action: A::Local(ShowHelp, None),
        },
        RouteRule {
            matcher: Exact("show scheduler"),
            action: A::Local(ShowPanel(Panel::Scheduler), Some("schedule list")),
        },
        RouteRule {
            matcher: Exact("hide scheduler"),
            action: A::Local(HidePanel(Panel::Scheduler), None),
        },
        RouteRule {
            matcher: Exact("show counselor"),
            action: A::Local(ShowPanel(Panel::Counselor), None),
        },
        RouteRule {
            matcher: Exact("hide counselor"),
            action: A::Local(HidePanel(Panel::Counselor), None),
        },
        RouteRule {
            matcher: Exact("show branding"),
            action: A::Local(ShowPanel(Panel::Branding), None),
        },
        RouteRule {
            matcher: Exact("hide branding"),
            action: A::Local(HidePanel(Panel::Branding), None),
        },
        RouteRule {
            matcher: Exact("voice on"),
            action: A::Local(SetVoice(true), None),
        },
        RouteRule {
            matcher: Exact("voice off"),
            action: A::Local(SetVoice(false), None),
        },
        // Consent management phrases.
        RouteRule {
            matcher: Exact("grant consent"),
            action: A::ConsentGrant,
        },
        RouteRule {
            matcher: Exact("revoke consent"),
            action: A::ConsentRevoke,
        },
        // Skill surface: a bare "skills" lists them, "skill <id> <input>"
        // runs one; both hit the dedicated HTTP skills endpoints.
        RouteRule {
            matcher: Exact("skills"),
            action: A::ListSkills,
        },
        RouteRule {
            matcher: Prefix("skill "),
            action: A::RunSkill,
        },
        // Privileged system scope: socket + consent gate when connected.
        RouteRule {
            matcher: Prefix("system "),
            action: A::PrivilegedCommand,
        },
        // Fast paths: always HTTP so they keep working when the socket or
        // its consent flow is unavailable.
        RouteRule {
            matcher: Prefix("code "),
            action: A::HttpCommand,
        },
        RouteRule {
            matcher: Prefix("exec "),
            action: A::HttpCommand,
        },
        RouteRule {
            matcher: Prefix("execute "),
            action: A::HttpCommand,
        },
        RouteRule {
            matcher: Prefix("skills "),
            action: A::HttpCommand,
        },
        RouteRule {
            matcher: Prefix("google "),
            action: A::HttpCommand,
        },
        RouteRule {
            matcher: Prefix("ecosystem "),
            action: A::HttpCommand,
        },
        // Browser-automation subcommands route to the backend as commands.
        RouteRule {
            matcher: Prefix("browser "),
            action: A::Command,
        },
        // Generic command-like input.
        RouteRule {
            matcher: CommandMarker,
            action: A::Command,
        },
        RouteRule {
            matcher: ControlVerb,
            action: A::Command,
        },
        // Everything else passes through as chat.
        RouteRule {
            matcher: Always,
            action: A::Speak,
        },
    ]
});

/// Stateless input classifier over the routing table.
pub struct CommandRouter;

impl CommandRouter {
    /// Classifies one raw line of input.
    pub fn route(input: &str) -> RouteDecision {
        let text = input.trim();
        let lowered = text.to_lowercase();

        for rule in ROUTING_TABLE.iter() {
            if !rule.matcher.matches(&lowered) {
                continue;
            }
            return match &rule.action {
                RuleAction::Local(action, follow_up) => RouteDecision::Local {
                    action: *action,
                    follow_up: follow_up.map(str::to_string),
                },
                RuleAction::ConsentGrant => RouteDecision::ConsentGrant,
                RuleAction::ConsentRevoke => RouteDecision::ConsentRevoke,
                RuleAction::HttpCommand => RouteDecision::HttpCommand {
                    text: text.to_string(),
                },
                RuleAction::ListSkills => RouteDecision::ListSkills,
                RuleAction::RunSkill => {
                    let rest = text["skill ".len()..].trim();
                    let (skill_id, input) = match rest.split_once(char::is_whitespace) {
                        Some((id, input)) => (id.to_string(), input.trim().to_string()),
                        None => (rest.to_string(), String::new()),
                    };
                    RouteDecision::RunSkill { skill_id, input }
                }
                RuleAction::PrivilegedCommand => RouteDecision::PrivilegedCommand {
                    text: text.to_string(),
                },
                RuleAction::Command => RouteDecision::Command {
                    text: text.to_string(),
                },
                RuleAction::Speak => RouteDecision::Speak {
                    text: text.to_string(),
                },
            };
        }

        // The table ends in a catch-all, so this is unreachable in practice.
        RouteDecision::Speak {
            text: text.to_string(),
        }
    }
}

impl Matcher {
    fn matches(&self, lowered: &str) -> bool {
        match self {
            Matcher::Exact(phrase) => lowered == *phrase,
            Matcher::Prefix(prefix) => lowered.starts_with(prefix),
            Matcher::CommandMarker => lowered.starts_with('/'),
            Matcher::ControlVerb => lowered
                .split_whitespace()
                .any(|word| CONTROL_VERBS.contains(&word)),
            Matcher::Always => true,
        }
    }
}

/// Help text listing the recognized local phrases.
pub const HELP_TEXT: &str = "\
Local commands:
  help                      show this text
  show/hide scheduler       toggle the scheduler panel
  show/hide counselor       toggle the counselor panel
  show/hide branding        toggle the branding panel
  voice on/off              toggle spoken responses
  grant/revoke consent      manage Tier-2 consent
  skills                    list backend skills
  skill <id> <input>        run one skill
Backend commands:
  system <...>              privileged commands (consent required)
  code|exec|execute|skills|google|ecosystem <...>   fast-path commands
  browser <...>             browser automation
Anything else is sent as chat.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_routes_to_speak() {
        assert_eq!(
            CommandRouter::route("Hello there"),
            RouteDecision::Speak {
                text: "Hello there".to_string()
            }
        );
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert!(matches!(
            CommandRouter::route("  VOICE ON "),
            RouteDecision::Local {
                action: LocalAction::SetVoice(true),
                ..
            }
        ));
        assert!(matches!(
            CommandRouter::route("SYSTEM browser status"),
            RouteDecision::PrivilegedCommand { .. }
        ));
    }

    #[test]
    fn test_fast_path_prefixes_route_to_http() {
        for input in [
            "code refactor the parser",
            "exec ls -la",
            "execute cleanup",
            "skills list",
            "google rust atomics",
            "ecosystem status",
        ] {
            match CommandRouter::route(input) {
                RouteDecision::HttpCommand { text } => assert_eq!(text, input),
                other => panic!("{} should be a fast path, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_system_prefix_is_privileged_not_http() {
        assert_eq!(
            CommandRouter::route("system browser status"),
            RouteDecision::PrivilegedCommand {
                text: "system browser status".to_string()
            }
        );
    }

    #[test]
    fn test_original_casing_is_preserved_in_payload() {
        match CommandRouter::route("Execute The Plan") {
            RouteDecision::HttpCommand { text } => assert_eq!(text, "Execute The Plan"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_scheduler_toggle_carries_separate_follow_up() {
        match CommandRouter::route("show scheduler") {
            RouteDecision::Local { action, follow_up } => {
                assert_eq!(action, LocalAction::ShowPanel(Panel::Scheduler));
                assert_eq!(follow_up.as_deref(), Some("schedule list"));
            }
            other => panic!("unexpected {:?}", other),
        }
        match CommandRouter::route("hide scheduler") {
            RouteDecision::Local { follow_up, .. } => assert!(follow_up.is_none()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_control_verbs_make_input_a_command() {
        assert!(matches!(
            CommandRouter::route("please run the nightly backup"),
            RouteDecision::Command { .. }
        ));
        assert!(matches!(
            CommandRouter::route("schedule a reminder for Monday"),
            RouteDecision::Command { .. }
        ));
        // A verb embedded in a longer word does not count.
        assert!(matches!(
            CommandRouter::route("the runner finished the race"),
            RouteDecision::Speak { .. }
        ));
    }

    #[test]
    fn test_slash_marker_is_a_command() {
        assert!(matches!(
            CommandRouter::route("/status"),
            RouteDecision::Command { .. }
        ));
    }

    #[test]
    fn test_consent_phrases() {
        assert_eq!(CommandRouter::route("grant consent"), RouteDecision::ConsentGrant);
        assert_eq!(CommandRouter::route("revoke consent"), RouteDecision::ConsentRevoke);
    }

    #[test]
    fn test_skill_surface_routing() {
        assert_eq!(CommandRouter::route("skills"), RouteDecision::ListSkills);
        assert_eq!(
            CommandRouter::route("skill summarize the last meeting"),
            RouteDecision::RunSkill {
                skill_id: "summarize".to_string(),
                input: "the last meeting".to_string(),
            }
        );
        assert_eq!(
            CommandRouter::route("skill ping"),
            RouteDecision::RunSkill {
                skill_id: "ping".to_string(),
                input: String::new(),
            }
        );
        // The plural prefix stays on the HTTP fast path.
        assert!(matches!(
            CommandRouter::route("skills list"),
            RouteDecision::HttpCommand { .. }
        ));
    }

    #[test]
    fn test_first_match_wins_over_later_rules() {
        // "execute " is both a fast-path prefix and a control verb; the
        // fast-path rule sits earlier in the table and must win.
        assert!(matches!(
            CommandRouter::route("execute order 66"),
            RouteDecision::HttpCommand { .. }
        ));
    }
}
