use tokio::sync::mpsc;

use crate::conversation::Conversation;
use crate::error::AgentError;

/// Text fragments of one model turn, in arrival order.
///
/// The stream is consumed once. When the source is exhausted the assembled
/// text is appended to the owning conversation as the assistant reply, and
/// every later call to [`TextStream::next`] returns `None`. An error item
/// ends the stream without recording anything.
pub struct TextStream<'a> {
    rx: mpsc::Receiver<Result<String, AgentError>>,
    conversation: Option<&'a mut Conversation>,
    assembled: String,
    finished: bool,
}

impl<'a> TextStream<'a> {
    pub fn new(
        rx: mpsc::Receiver<Result<String, AgentError>>,
        conversation: &'a mut Conversation,
    ) -> Self {
        Self {
            rx,
            conversation: Some(conversation),
            assembled: String::new(),
            finished: false,
        }
    }

    /// A stream over already-known fragments.
    pub fn from_chunks<I>(chunks: I, conversation: &'a mut Conversation) -> Self
    where
        I: IntoIterator<Item = Result<String, AgentError>>,
    {
        let chunks: Vec<_> = chunks.into_iter().collect();
        let (tx, rx) = mpsc::channel(chunks.len().max(1));
        for chunk in chunks {
            // Capacity covers every chunk, so this cannot fail.
            let _ = tx.try_send(chunk);
        }
        Self::new(rx, conversation)
    }

    pub async fn next(&mut self) -> Option<Result<String, AgentError>> {
        if self.finished {
            return None;
        }

        match self.rx.recv().await {
            Some(Ok(chunk)) => {
                self.assembled.push_str(&chunk);
                Some(Ok(chunk))
            }
            Some(Err(e)) => {
                self.finish();
                Some(Err(e))
            }
            None => {
                self.finish();
                if let Some(conversation) = self.conversation.take() {
                    conversation.push_assistant(self.assembled.clone());
                }
                None
            }
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.rx.close();
    }

    /// Text received so far.
    pub fn assembled(&self) -> &str {
        &self.assembled
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drain the stream and return the concatenated text.
    pub async fn collect_text(mut self) -> Result<String, AgentError> {
        while let Some(chunk) = self.next().await {
            chunk?;
        }
        Ok(std::mem::take(&mut self.assembled))
    }
}

impl std::fmt::Debug for TextStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextStream")
            .field("assembled_len", &self.assembled.len())
            .field("finished", &self.finished)
            .finish()
    }
}
