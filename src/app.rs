use anyhow::{anyhow, Result};
use tokio::task::JoinHandle;

use crate::client::ChatClient;
use crate::session::{SendOutcome, Session};

pub struct App {
    pub should_quit: bool,
    pub session: Session,
    pub client: ChatClient,

    // Input state
    pub input_cursor: usize, // cursor position in session.input, in chars

    // Conversation pane state
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of the chat area, set during render
    pub chat_width: u16,  // inner width of the chat area, set during render

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // In-flight chat call, if any
    pub chat_task: Option<JoinHandle<Result<String>>>,
}

impl App {
    pub fn new(client: ChatClient) -> Self {
        Self {
            should_quit: false,
            session: Session::new(),
            client,
            input_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            chat_task: None,
        }
    }

    /// Text entry is open only once the service is ready and no dispatch is
    /// in flight.
    pub fn input_enabled(&self) -> bool {
        self.session.is_ready() && !self.session.is_busy()
    }

    /// Submit the staged input. On accept, the chat call runs in a spawned
    /// task and is picked up by `poll_dispatch` when it finishes.
    pub fn submit(&mut self) {
        match self.session.send() {
            SendOutcome::Dispatched(prompt) => {
                self.input_cursor = 0;
                let client = self.client.clone();
                self.chat_task = Some(tokio::spawn(async move {
                    client.chat(&prompt).await
                }));
                self.scroll_to_bottom();
            }
            SendOutcome::NotReady => {
                self.scroll_to_bottom();
            }
            SendOutcome::Busy | SendOutcome::Empty => {}
        }
    }

    /// Settle the in-flight chat call if it has finished. Called from the
    /// main loop after every event, so a Tick is enough to pick it up.
    pub async fn poll_dispatch(&mut self) {
        let finished = self
            .chat_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.chat_task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(err) => Err(anyhow!("chat task failed: {}", err)),
            };
            self.session.settle(result);
            self.scroll_to_bottom();
        }
    }

    pub fn mark_ready(&mut self) {
        self.session.mark_ready();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn scroll_half_page_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(self.chat_height / 2);
    }

    pub fn scroll_half_page_down(&mut self) {
        self.chat_scroll = self
            .chat_scroll
            .saturating_add((self.chat_height / 2).max(1));
    }

    /// Snap the conversation pane to its newest entry. The wrapped-line
    /// estimate must stay in step with how `ui` lays the pane out.
    pub fn scroll_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.session.messages() {
            total_lines += 1; // Label line ("You:" or "AI:")
            for line in msg.text.lines() {
                total_lines += wrapped_line_count(line, wrap_width);
            }
            total_lines += 1; // Blank line after message
        }

        if self.session.is_busy() {
            total_lines += 2; // "AI:" + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.chat_scroll = 0;
        }
    }
}

/// How many rows one logical line occupies at the given wrap width.
/// Counts characters, not bytes, so multibyte text wraps correctly.
pub fn wrapped_line_count(line: &str, wrap_width: usize) -> u16 {
    if wrap_width == 0 {
        return 1;
    }
    let char_count = line.chars().count();
    if char_count == 0 {
        1
    } else {
        ((char_count - 1) / wrap_width + 1) as u16
    }
}
