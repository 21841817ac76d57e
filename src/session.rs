use anyhow::Result;

pub const NOT_READY_NOTICE: &str = "AI service is still loading. Please wait...";
pub const GENERIC_FAILURE: &str = "Something went wrong";

/// A single entry in the conversation. Immutable once appended.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: u64,
    pub author: Author,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User,
    Assistant,
}

/// What `Session::send` did with the staged input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Accepted: the user message was appended and the trimmed text should
    /// be relayed to the service exactly once.
    Dispatched(String),
    /// Rejected with a loading notice; nothing was relayed.
    NotReady,
    /// A dispatch is already in flight; nothing happened.
    Busy,
    /// Blank input; nothing happened.
    Empty,
}

/// Conversation state for one run of the client: the append-only message
/// log, the staged input line, and the ready/busy flags that gate dispatch.
pub struct Session {
    messages: Vec<Message>,
    pub input: String,
    ready: bool,
    busy: bool,
    next_id: u64,
}

impl Session {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            input: String::new(),
            ready: false,
            busy: false,
            next_id: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Flip the ready flag. One-way: there is no operation to unset it.
    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    /// Consume the staged input. Guard order matches the dispatch contract:
    /// blank input is ignored silently, a not-ready service answers with a
    /// notice instead of relaying, and an in-flight dispatch blocks a second
    /// one. On accept the user message is appended and the input cleared
    /// before the caller starts the external call.
    pub fn send(&mut self) -> SendOutcome {
        let text = self.input.trim();
        if text.is_empty() {
            return SendOutcome::Empty;
        }

        if !self.ready {
            self.append(Author::Assistant, NOT_READY_NOTICE.to_string());
            return SendOutcome::NotReady;
        }

        if self.busy {
            return SendOutcome::Busy;
        }

        let text = text.to_string();
        self.append(Author::User, text.clone());
        self.input.clear();
        self.busy = true;
        SendOutcome::Dispatched(text)
    }

    /// Record the outcome of the in-flight dispatch. Exactly one assistant
    /// message is appended and the busy flag drops on both branches.
    pub fn settle(&mut self, result: Result<String>) {
        let text = match result {
            Ok(reply) => reply,
            Err(err) => {
                let desc = err.to_string();
                let desc = if desc.is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    desc
                };
                format!("Error: {}", desc)
            }
        };
        self.append(Author::Assistant, text);
        self.busy = false;
    }

    fn append(&mut self, author: Author, text: String) {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message { id, author, text });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn ready_session() -> Session {
        let mut session = Session::new();
        session.mark_ready();
        session
    }

    #[test]
    fn test_send_before_ready_appends_notice_only() {
        let mut session = Session::new();
        session.input = "hi".to_string();

        assert_eq!(session.send(), SendOutcome::NotReady);

        assert_eq!(session.messages().len(), 1);
        let notice = &session.messages()[0];
        assert_eq!(notice.author, Author::Assistant);
        assert_eq!(notice.text, NOT_READY_NOTICE);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_successful_exchange() {
        let mut session = ready_session();
        session.input = "hello".to_string();

        assert_eq!(session.send(), SendOutcome::Dispatched("hello".to_string()));
        assert!(session.is_busy());
        assert!(session.input.is_empty());

        session.settle(Ok("Hi there".to_string()));

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].author, Author::User);
        assert_eq!(messages[0].text, "hello");
        assert_eq!(messages[1].author, Author::Assistant);
        assert_eq!(messages[1].text, "Hi there");
        assert!(!session.is_busy());
    }

    #[test]
    fn test_failed_exchange_surfaces_error_text() {
        let mut session = ready_session();
        session.input = "hello".to_string();
        session.send();

        session.settle(Err(anyhow!("timeout")));

        let last = session.messages().last().unwrap();
        assert_eq!(last.author, Author::Assistant);
        assert_eq!(last.text, "Error: timeout");
        assert!(!session.is_busy());
    }

    #[test]
    fn test_failure_without_description_gets_fallback() {
        let mut session = ready_session();
        session.input = "hello".to_string();
        session.send();

        session.settle(Err(anyhow!("")));

        let last = session.messages().last().unwrap();
        assert_eq!(last.text, format!("Error: {}", GENERIC_FAILURE));
    }

    #[test]
    fn test_whitespace_input_is_ignored_everywhere() {
        let mut session = Session::new();
        for input in ["", "   ", "\t", " \t "] {
            session.input = input.to_string();
            assert_eq!(session.send(), SendOutcome::Empty);
        }
        assert!(session.messages().is_empty());

        session.mark_ready();
        session.input = "   ".to_string();
        assert_eq!(session.send(), SendOutcome::Empty);
        assert!(session.messages().is_empty());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_input_is_trimmed_on_accept() {
        let mut session = ready_session();
        session.input = "  hello  ".to_string();

        assert_eq!(session.send(), SendOutcome::Dispatched("hello".to_string()));
        assert_eq!(session.messages()[0].text, "hello");
    }

    #[test]
    fn test_busy_gates_second_dispatch() {
        let mut session = ready_session();
        session.input = "first".to_string();
        session.send();

        session.input = "second".to_string();
        assert_eq!(session.send(), SendOutcome::Busy);

        // Only the first user message made it into the log.
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.input, "second");

        session.settle(Ok("done".to_string()));
        assert_eq!(session.send(), SendOutcome::Dispatched("second".to_string()));
    }

    #[test]
    fn test_ready_flag_is_monotonic() {
        let mut session = Session::new();
        assert!(!session.is_ready());
        session.mark_ready();
        session.mark_ready();
        assert!(session.is_ready());
    }

    #[test]
    fn test_message_ids_are_unique() {
        let mut session = ready_session();
        for i in 0..5 {
            session.input = format!("message {}", i);
            session.send();
            session.settle(Ok(format!("reply {}", i)));
        }

        let mut ids: Vec<u64> = session.messages().iter().map(|m| m.id).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn test_log_grows_by_two_per_exchange_and_one_per_rejection() {
        let mut session = Session::new();

        session.input = "too early".to_string();
        session.send();
        assert_eq!(session.messages().len(), 1);

        session.mark_ready();
        session.input = "hello".to_string();
        session.send();
        session.settle(Ok("hi".to_string()));
        assert_eq!(session.messages().len(), 3);

        session.input = "again".to_string();
        session.send();
        session.settle(Err(anyhow!("boom")));
        assert_eq!(session.messages().len(), 5);
    }
}
