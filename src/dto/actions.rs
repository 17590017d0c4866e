//! Interaction payloads and the closed set of actions the bot dispatches on.
//! Action identifiers arrive as strings; they are resolved into one tagged
//! variant per action, each carrying its decoded payload, so handlers never
//! touch untyped values.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::round::codec::decode_thread_ref;
use crate::services::confirm_service::SolvePayload;

/// Wire identifiers of every interactive element the bot creates.
pub mod ids {
    /// Yes button of the public solve prompt.
    pub const CONFIRM_SOLVE: &str = "confirm_solve";
    /// No button of the public solve prompt.
    pub const CANCEL_SOLVE: &str = "cancel_solve";
    /// "Answer privately" button on the question message.
    pub const SUBMIT_PRIVATE_ANSWER: &str = "submit_private_answer";
    /// Yes button of the private-answer prompt.
    pub const CONFIRM_PRIVATE_SOLVE: &str = "confirm_private_solve";
    /// No button of the private-answer prompt.
    pub const CANCEL_PRIVATE_SOLVE: &str = "cancel_private_solve";
    /// "Edit question" button on the question message.
    pub const EDIT_QUESTION: &str = "edit_question";
    /// "Close round" button on the question message.
    pub const CLOSE_ROUND: &str = "close_round";
    /// "View answer" button on a solved question message.
    pub const VIEW_ANSWER: &str = "view_answer";
    /// Callback id of the private-answer modal.
    pub const PRIVATE_ANSWER_MODAL: &str = "private_answer_modal";
    /// Callback id of the edit-question modal.
    pub const EDIT_QUESTION_MODAL: &str = "edit_question_modal";
}

/// One fully-decoded button press.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// OP confirmed a public guess.
    ConfirmSolve(SolvePayload),
    /// OP declined a public guess.
    CancelSolve(SolvePayload),
    /// A user wants the private-answer modal.
    SubmitPrivateAnswer {
        /// Channel of the round.
        channel: String,
        /// Thread anchoring the round.
        thread_ts: String,
    },
    /// OP confirmed a private answer.
    ConfirmPrivateSolve(SolvePayload),
    /// OP declined a private answer.
    CancelPrivateSolve(SolvePayload),
    /// OP wants the edit-question modal.
    EditQuestion {
        /// Channel of the round.
        channel: String,
        /// Thread anchoring the round.
        thread_ts: String,
    },
    /// OP closes the round.
    CloseRound {
        /// Channel of the round.
        channel: String,
        /// Thread anchoring the round.
        thread_ts: String,
    },
    /// Someone wants to see the accepted answer.
    ViewAnswer {
        /// Channel of the round.
        channel: String,
        /// Thread anchoring the round.
        thread_ts: String,
    },
}

impl Action {
    /// Resolve an action id and its carried value into a typed action.
    /// Unknown ids and undecodable values resolve to `None`.
    pub fn parse(action_id: &str, value: Option<&str>) -> Option<Self> {
        let solve = |value: Option<&str>| value.and_then(SolvePayload::decode);
        let thread = |value: Option<&str>| value.and_then(decode_thread_ref);
        match action_id {
            ids::CONFIRM_SOLVE => solve(value).map(Action::ConfirmSolve),
            ids::CANCEL_SOLVE => solve(value).map(Action::CancelSolve),
            ids::CONFIRM_PRIVATE_SOLVE => solve(value).map(Action::ConfirmPrivateSolve),
            ids::CANCEL_PRIVATE_SOLVE => solve(value).map(Action::CancelPrivateSolve),
            ids::SUBMIT_PRIVATE_ANSWER => thread(value)
                .map(|(channel, thread_ts)| Action::SubmitPrivateAnswer { channel, thread_ts }),
            ids::EDIT_QUESTION => {
                thread(value).map(|(channel, thread_ts)| Action::EditQuestion { channel, thread_ts })
            }
            ids::CLOSE_ROUND => {
                thread(value).map(|(channel, thread_ts)| Action::CloseRound { channel, thread_ts })
            }
            ids::VIEW_ANSWER => {
                thread(value).map(|(channel, thread_ts)| Action::ViewAnswer { channel, thread_ts })
            }
            _ => None,
        }
    }
}

/// Envelope of the interactivity webhook (`payload` form field, JSON).
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionPayload {
    /// One or more button presses.
    BlockActions {
        /// Acting user.
        user: UserRef,
        /// Short-lived id for opening modals.
        #[serde(default)]
        trigger_id: String,
        /// The pressed elements.
        #[serde(default)]
        actions: Vec<ActionInvocation>,
        /// Channel containing the pressed message, when there is one.
        #[serde(default)]
        channel: Option<ChannelRef>,
    },
    /// A modal was submitted.
    ViewSubmission {
        /// Acting user.
        user: UserRef,
        /// The submitted view.
        view: ViewPayload,
    },
    /// Interaction types the bot does not consume.
    #[serde(other)]
    Other,
}

/// Minimal user object inside interaction payloads.
#[derive(Debug, Deserialize)]
pub struct UserRef {
    /// User id.
    pub id: String,
}

/// Minimal channel object inside interaction payloads.
#[derive(Debug, Deserialize)]
pub struct ChannelRef {
    /// Channel id.
    pub id: String,
}

/// One pressed element of a block-actions payload.
#[derive(Debug, Deserialize)]
pub struct ActionInvocation {
    /// Identifier of the pressed element.
    pub action_id: String,
    /// Value carried by the element.
    #[serde(default)]
    pub value: Option<String>,
}

/// Submitted modal view.
#[derive(Debug, Deserialize)]
pub struct ViewPayload {
    /// Which modal this is.
    pub callback_id: String,
    /// Round-tripped payload attached when the modal was opened.
    #[serde(default)]
    pub private_metadata: String,
    /// Entered values keyed by block id then action id.
    #[serde(default)]
    pub state: ViewState,
}

/// `state` object of a submitted view.
#[derive(Debug, Default, Deserialize)]
pub struct ViewState {
    /// block id -> action id -> entered value.
    #[serde(default)]
    pub values: BTreeMap<String, BTreeMap<String, InputValue>>,
}

/// One entered input value.
#[derive(Debug, Deserialize)]
pub struct InputValue {
    /// The text the user typed, if any.
    #[serde(default)]
    pub value: Option<String>,
}

impl ViewPayload {
    /// Entered text of the input element with the given action id.
    pub fn input_value(&self, action_id: &str) -> Option<&str> {
        self.state
            .values
            .values()
            .find_map(|inputs| inputs.get(action_id))
            .and_then(|input| input.value.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round::codec::encode_thread_ref;

    #[test]
    fn thread_ref_actions_parse_into_typed_variants() {
        let value = encode_thread_ref("C1", "1.000001");
        assert_eq!(
            Action::parse(ids::CLOSE_ROUND, Some(&value)),
            Some(Action::CloseRound {
                channel: "C1".into(),
                thread_ts: "1.000001".into(),
            })
        );
        assert_eq!(
            Action::parse(ids::VIEW_ANSWER, Some(&value)),
            Some(Action::ViewAnswer {
                channel: "C1".into(),
                thread_ts: "1.000001".into(),
            })
        );
    }

    #[test]
    fn unknown_or_malformed_actions_resolve_to_none() {
        assert_eq!(Action::parse("some_future_action", Some("x")), None);
        assert_eq!(Action::parse(ids::CLOSE_ROUND, Some("!!not a ref!!")), None);
        assert_eq!(Action::parse(ids::CONFIRM_SOLVE, None), None);
        assert_eq!(Action::parse(ids::CONFIRM_SOLVE, Some("garbage")), None);
    }

    #[test]
    fn block_actions_payload_parses() {
        let json = r#"{
            "type": "block_actions",
            "user": {"id": "U1"},
            "trigger_id": "trig123",
            "channel": {"id": "C1"},
            "actions": [{"action_id": "close_round", "value": "abc", "block_id": "b1"}]
        }"#;
        let payload: InteractionPayload = serde_json::from_str(json).unwrap();
        let InteractionPayload::BlockActions { user, actions, trigger_id, channel } = payload
        else {
            panic!("expected block actions");
        };
        assert_eq!(user.id, "U1");
        assert_eq!(trigger_id, "trig123");
        assert_eq!(channel.unwrap().id, "C1");
        assert_eq!(actions[0].action_id, "close_round");
    }

    #[test]
    fn view_submission_exposes_input_values() {
        let json = r#"{
            "type": "view_submission",
            "user": {"id": "U2"},
            "view": {
                "callback_id": "private_answer_modal",
                "private_metadata": "meta",
                "state": {"values": {"answer_input": {"answer_input": {"type": "plain_text_input", "value": "a piano"}}}}
            }
        }"#;
        let payload: InteractionPayload = serde_json::from_str(json).unwrap();
        let InteractionPayload::ViewSubmission { view, .. } = payload else {
            panic!("expected view submission");
        };
        assert_eq!(view.callback_id, "private_answer_modal");
        assert_eq!(view.input_value("answer_input"), Some("a piano"));
        assert_eq!(view.input_value("missing"), None);
    }
}
