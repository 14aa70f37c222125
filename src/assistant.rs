use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::generation::GenerationError;

/// Shown instead of any raw error text. Children never see diagnostics.
pub const FALLBACK_ANSWER: &str =
    "Oops! Codie got a little mixed up and couldn't think of an answer. \
     Please try asking me again!";

const SYSTEM_INSTRUCTION: &str = "You are Codie, a friendly and patient classroom \
helper for young learners. Answer in short, simple, cheerful sentences that a \
child can understand. Only talk about the lesson you are given. If a question is \
off-topic or not appropriate for the classroom, kindly say \"Let's stick to our \
lesson!\" and invite a question about the lesson instead.";

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    Learner,
    Helper,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub author: Author,
    pub text: String,
    pub at: DateTime<Local>,
}

impl Message {
    fn now(author: Author, text: impl Into<String>) -> Self {
        Self {
            author,
            text: text.into(),
            at: Local::now(),
        }
    }
}

/// Lifecycle of the single outstanding generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Awaiting,
    Done,
    Failed,
}

/// Outbound request handed to the worker thread.
#[derive(Debug, Clone)]
pub struct QuestionRequest {
    pub token: u64,
    pub system: String,
    pub prompt: String,
}

/// Worker reply routed back through the event channel.
#[derive(Debug)]
pub struct AssistantReply {
    pub token: u64,
    pub result: Result<String, GenerationError>,
}

/// A transient Q&A conversation scoped to one open lesson.
///
/// The transcript is append-only in submission order; the request state
/// machine guarantees at most one call in flight. The session token ties
/// replies to the session that asked: a reply that arrives after the session
/// was discarded carries a stale token and is dropped.
#[derive(Debug)]
pub struct AssistantSession {
    lesson_title: String,
    messages: Vec<Message>,
    state: RequestState,
    token: u64,
}

impl AssistantSession {
    /// Open a fresh, empty session bound to the given lesson.
    pub fn open(lesson_title: impl Into<String>) -> Self {
        Self {
            lesson_title: lesson_title.into(),
            messages: Vec::new(),
            state: RequestState::Idle,
            token: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn lesson_title(&self) -> &str {
        &self.lesson_title
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == RequestState::Awaiting
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    /// Accept a question and produce the outbound request.
    ///
    /// Blank questions and questions submitted while a request is already in
    /// flight are silently ignored (the input is expected to be gated in the
    /// UI): no transcript change, no request. Otherwise the learner message
    /// is appended immediately and the session moves to `Awaiting`.
    pub fn submit_question(&mut self, text: &str) -> Option<QuestionRequest> {
        let question = text.trim();
        if question.is_empty() || self.state == RequestState::Awaiting {
            return None;
        }

        self.messages.push(Message::now(Author::Learner, question));
        self.state = RequestState::Awaiting;

        // Single-shot: each call stands alone, no prior transcript is sent.
        Some(QuestionRequest {
            token: self.token,
            system: SYSTEM_INSTRUCTION.to_string(),
            prompt: format!(
                "The learner is currently on the lesson \"{}\". \
                 Their question is: {question}",
                self.lesson_title
            ),
        })
    }

    /// Apply a worker reply. Stale replies (token mismatch after the owning
    /// session was discarded) are dropped without touching the transcript.
    pub fn resolve(&mut self, reply: AssistantReply) {
        if reply.token != self.token {
            debug!(
                got = reply.token,
                live = self.token,
                "dropping reply for a discarded assistant session"
            );
            return;
        }
        if self.state != RequestState::Awaiting {
            return;
        }

        match reply.result {
            Ok(answer) => {
                self.messages.push(Message::now(Author::Helper, answer));
                self.state = RequestState::Done;
            }
            Err(err) => {
                warn!(error = %err, lesson = %self.lesson_title, "helper request failed");
                self.messages
                    .push(Message::now(Author::Helper, FALLBACK_ANSWER));
                self.state = RequestState::Failed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn ok_reply(session: &AssistantSession, text: &str) -> AssistantReply {
        AssistantReply {
            token: session.token(),
            result: Ok(text.to_string()),
        }
    }

    #[test]
    fn opens_empty_and_idle() {
        let session = AssistantSession::open("Lesson 2: Keyboarding");

        assert_eq!(session.lesson_title(), "Lesson 2: Keyboarding");
        assert!(session.messages().is_empty());
        assert_eq!(session.state(), RequestState::Idle);
        assert!(!session.is_pending());
    }

    #[test]
    fn sessions_get_distinct_tokens() {
        let a = AssistantSession::open("a");
        let b = AssistantSession::open("b");

        assert_ne!(a.token(), b.token());
    }

    #[test]
    fn submit_appends_learner_message_and_awaits() {
        let mut session = AssistantSession::open("Keyboarding");

        let request = session.submit_question("what is a keyboard").unwrap();

        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].author, Author::Learner);
        assert_eq!(session.messages()[0].text, "what is a keyboard");
        assert!(session.is_pending());
        assert!(request.prompt.contains("Keyboarding"));
        assert!(request.prompt.contains("what is a keyboard"));
        assert!(request.system.contains("Codie"));
    }

    #[test]
    fn blank_question_is_ignored() {
        let mut session = AssistantSession::open("Keyboarding");

        assert!(session.submit_question("").is_none());
        assert!(session.submit_question("   \t ").is_none());
        assert!(session.messages().is_empty());
        assert_eq!(session.state(), RequestState::Idle);
    }

    #[test]
    fn second_submission_while_pending_is_ignored() {
        let mut session = AssistantSession::open("Keyboarding");

        assert!(session.submit_question("first").is_some());
        assert!(session.submit_question("second").is_none());

        assert_eq!(session.messages().len(), 1);
        assert!(session.is_pending());
    }

    #[test]
    fn successful_reply_appends_helper_message() {
        let mut session = AssistantSession::open("Keyboarding");
        session.submit_question("what is a keyboard").unwrap();

        let reply = ok_reply(&session, "A keyboard is how you type letters!");
        session.resolve(reply);

        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].author, Author::Helper);
        assert_eq!(session.messages()[1].text, "A keyboard is how you type letters!");
        assert_eq!(session.state(), RequestState::Done);
        assert!(!session.is_pending());
    }

    #[test]
    fn failed_reply_appends_fixed_apology() {
        let mut session = AssistantSession::open("Keyboarding");
        session.submit_question("what is a keyboard").unwrap();

        session.resolve(AssistantReply {
            token: session.token(),
            result: Err(GenerationError::Disabled),
        });

        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].text, FALLBACK_ANSWER);
        assert_matches!(session.state(), RequestState::Failed);
        assert!(!session.is_pending());
    }

    #[test]
    fn can_ask_again_after_success_or_failure() {
        let mut session = AssistantSession::open("Keyboarding");

        session.submit_question("one").unwrap();
        let reply = ok_reply(&session, "answer");
        session.resolve(reply);
        assert!(session.submit_question("two").is_some());

        session.resolve(AssistantReply {
            token: session.token(),
            result: Err(GenerationError::EmptyResponse),
        });
        assert!(session.submit_question("three").is_some());
        assert_eq!(session.messages().len(), 5);
    }

    #[test]
    fn stale_reply_is_dropped() {
        let old = {
            let mut session = AssistantSession::open("Keyboarding");
            session.submit_question("question").unwrap()
        };
        // Session above was discarded; a new one is open on another lesson.
        let mut session = AssistantSession::open("History of Computers");

        session.resolve(AssistantReply {
            token: old.token,
            result: Ok("late answer".into()),
        });

        assert!(session.messages().is_empty());
        assert_eq!(session.state(), RequestState::Idle);
    }

    #[test]
    fn reply_without_outstanding_request_is_ignored() {
        let mut session = AssistantSession::open("Keyboarding");

        let reply = ok_reply(&session, "unsolicited");
        session.resolve(reply);

        assert!(session.messages().is_empty());
        assert_eq!(session.state(), RequestState::Idle);
    }

    #[test]
    fn question_is_trimmed_in_transcript_and_prompt() {
        let mut session = AssistantSession::open("Keyboarding");

        let request = session.submit_question("  why home row?  ").unwrap();

        assert_eq!(session.messages()[0].text, "why home row?");
        assert!(request.prompt.ends_with("why home row?"));
    }
}
