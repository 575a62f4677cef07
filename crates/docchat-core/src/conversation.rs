use crate::state::{Message, MessageId, Sender};

/// Ordered, append-only chat transcript.
///
/// Messages are only ever added at the end or dropped all at once by
/// [`ConversationStore::clear`]. Ids come from a counter that survives
/// `clear`, so an id is never handed out twice.
#[derive(Debug, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    next_id: MessageId,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, content: impl Into<String>, sender: Sender) -> &Message {
        self.next_id += 1;
        let message = Message::new(self.next_id, content.into(), sender);
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}
